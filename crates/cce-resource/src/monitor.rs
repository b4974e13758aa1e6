//! CPU load sampling.
//!
//! `sysinfo` needs two refreshes separated by a minimum interval to report a
//! meaningful CPU usage percentage. Rather than pay that latency on every
//! call, a single process-lifetime `System` is kept behind a `Mutex` so
//! `sample_cpu_pct` only pays the interval once per process (subsequent
//! calls observe the delta since the previous call). This is the one
//! exception to "each invocation takes a fresh sample": the *sampler
//! handle* is cached, never the *measurement*.

use std::sync::Mutex;
use sysinfo::System;

pub struct CpuSampler {
    system: Mutex<System>,
}

impl CpuSampler {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        Self {
            system: Mutex::new(system),
        }
    }

    /// Current global CPU utilization as a percentage (0.0–100.0).
    ///
    /// The first call after process start may read close to 0% because no
    /// prior sample exists yet to diff against; this is consistent with
    /// `sysinfo`'s documented behavior and is corrected by the next call.
    pub fn sample_cpu_pct(&self) -> f32 {
        let mut system = self.system.lock().unwrap_or_else(|e| e.into_inner());
        system.refresh_cpu_usage();
        system.global_cpu_usage()
    }
}

impl Default for CpuSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_within_percentage_bounds() {
        let sampler = CpuSampler::new();
        let pct = sampler.sample_cpu_pct();
        assert!((0.0..=100.0 * num_cpus_upper_bound()).contains(&pct));
    }

    // sysinfo's global_cpu_usage() is already normalized to 0-100 but we
    // leave headroom rather than assert an exact upper bound on shared CI
    // hosts with bursty accounting.
    fn num_cpus_upper_bound() -> f32 {
        2.0
    }
}
