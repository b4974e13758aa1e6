//! Resource monitor: samples host load and exposes a timeout
//! multiplier.

pub mod gpu;
pub mod monitor;

use monitor::CpuSampler;
use std::sync::OnceLock;

/// Load multiplier applied to every timeout computed by the Timing Oracle.
pub const MULTIPLIER_NORMAL: u8 = 1;
pub const MULTIPLIER_HIGH_LOAD: u8 = 3;

static CPU_SAMPLER: OnceLock<CpuSampler> = OnceLock::new();

fn cpu_sampler() -> &'static CpuSampler {
    CPU_SAMPLER.get_or_init(CpuSampler::new)
}

/// Compute the current load multiplier using the default high-load value
/// ([`MULTIPLIER_HIGH_LOAD`]). See [`multiplier_with`] for the
/// configurable form.
pub async fn multiplier(threshold_pct: f32) -> u8 {
    multiplier_with(threshold_pct, MULTIPLIER_HIGH_LOAD).await
}

/// Compute the current load multiplier.
///
/// Samples CPU utilization synchronously and, when available, GPU
/// utilization via a short-lived side-channel process. Returns
/// `high_load_value` if either exceeds `threshold_pct`, otherwise
/// [`MULTIPLIER_NORMAL`]. Any sampling failure is treated as "no load
/// signal" — this function never returns an error.
pub async fn multiplier_with(threshold_pct: f32, high_load_value: u8) -> u8 {
    let cpu_pct = cpu_sampler().sample_cpu_pct();
    if cpu_pct > threshold_pct {
        return high_load_value;
    }

    if let Some(gpu_pct) = gpu::sample_gpu_pct().await {
        if gpu_pct > threshold_pct {
            return high_load_value;
        }
    }

    MULTIPLIER_NORMAL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn multiplier_is_always_one_of_the_two_values() {
        let m = multiplier(14.0).await;
        assert!(m == MULTIPLIER_NORMAL || m == MULTIPLIER_HIGH_LOAD);
    }

    #[tokio::test]
    async fn zero_threshold_forces_high_load() {
        // Any positive CPU usage exceeds a 0% threshold.
        let m = multiplier(-1.0).await;
        assert_eq!(m, MULTIPLIER_HIGH_LOAD);
    }
}
