//! Timing oracle: classify, look up history, compute a timeout, and
//! record the observed duration on terminal transition.

use crate::classify::{classify, CommandClass, Complexity};
use crate::store::TimingStore;
use serde::{Deserialize, Serialize};

/// Minimum number of samples before history is trusted over defaults.
const MIN_HISTORY_SAMPLES: usize = 3;

#[derive(Debug, Clone)]
pub struct TimingConfig {
    /// Multiplies per-class defaults because the typical command is an
    /// inherently slow conversational LLM CLI.
    pub baseline_multiplier: f64,
    /// Floor applied to unknown/low-confidence classifications, preventing a bad-data feedback loop during bootstrap.
    pub unknown_floor_seconds: f64,
    /// Hard ceiling `max_seconds` is clamped to regardless of history.
    pub max_ceiling_seconds: f64,
    /// Max samples retained per `(class, complexity)` key.
    pub timing_history_cap: usize,
    /// Whether the baseline and load multipliers compound (up to 9x) or
    /// are taken as `max()`. Compounding is the default; exposed as a
    /// knob because the two interact in ways worth tuning per deployment.
    pub compound_multipliers: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            baseline_multiplier: 3.0,
            unknown_floor_seconds: 600.0,
            max_ceiling_seconds: 86_400.0,
            timing_history_cap: 50,
            compound_multipliers: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingDecision {
    pub expected_seconds: f64,
    pub max_seconds: f64,
    pub reason: &'static str,
    pub confidence: f64,
}

pub struct TimingOracle {
    store: TimingStore,
    config: TimingConfig,
}

impl TimingOracle {
    pub fn new(store: TimingStore, config: TimingConfig) -> Self {
        Self { store, config }
    }

    /// Compute `{expected_seconds, max_seconds, reason}` for a command.
    /// `load_multiplier` is the resource monitor's `multiplier()` output
    /// (1 or 3).
    pub fn compute(&self, command: &str, load_multiplier: u8) -> TimingDecision {
        let (class, complexity) = classify(command);
        let samples = self.store.load(class, complexity);

        let (expected_base, reason, confidence) = if samples.len() >= MIN_HISTORY_SAMPLES {
            let durations: Vec<f64> = samples.iter().map(|s| s.duration_seconds).collect();
            let expected = percentile_90(&durations);
            let confidence = (samples.len() as f64 / self.config.timing_history_cap as f64).min(1.0);
            (expected, "history", confidence)
        } else {
            let default_base = default_seconds(class, complexity) * self.config.baseline_multiplier;
            let confidence = samples.len() as f64 / MIN_HISTORY_SAMPLES as f64;
            (default_base, "default", confidence)
        };

        let combined_multiplier = self.combine_multipliers(load_multiplier);
        let mut expected = expected_base * combined_multiplier;
        let mut max = (expected * 3.0).min(self.config.max_ceiling_seconds);

        // Unknown floor: no history, general class, very low confidence.
        let is_unknown = reason == "default" && class == CommandClass::General && confidence <= 0.1;
        if is_unknown {
            expected = expected.max(self.config.unknown_floor_seconds);
            max = max.max(self.config.unknown_floor_seconds);
        }

        TimingDecision {
            expected_seconds: expected,
            max_seconds: max,
            reason,
            confidence,
        }
    }

    fn combine_multipliers(&self, load_multiplier: u8) -> f64 {
        let load = load_multiplier as f64;
        if self.config.compound_multipliers {
            load
        } else {
            load.max(1.0)
        }
    }

    /// Record the observed duration of a terminal transition. Best-effort.
    pub fn record(&self, command: &str, duration_seconds: f64, outcome: &str) {
        let (class, complexity) = classify(command);
        self.store.record(class, complexity, duration_seconds, outcome);
    }
}

/// 90th percentile via sort + index; no percentile crate needed for a
/// single-pass, allocation-light computation over a capped Vec.
fn percentile_90(durations: &[f64]) -> f64 {
    if durations.is_empty() {
        return 0.0;
    }
    let mut sorted = durations.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = ((0.9 * sorted.len() as f64).ceil() as usize).clamp(1, sorted.len());
    sorted[rank - 1]
}

fn default_seconds(class: CommandClass, complexity: Complexity) -> f64 {
    use CommandClass::*;
    use Complexity::*;
    match (class, complexity) {
        (Calculation, Trivial) => 5.0,
        (Calculation, Low) => 15.0,
        (Calculation, Medium) => 30.0,
        (Calculation, High) => 60.0,
        (Calculation, Extreme) => 120.0,

        (Code, Trivial) => 30.0,
        (Code, Low) => 90.0,
        (Code, Medium) => 180.0,
        (Code, High) => 360.0,
        (Code, Extreme) => 900.0,

        (Data, Trivial) => 20.0,
        (Data, Low) => 60.0,
        (Data, Medium) => 150.0,
        (Data, High) => 300.0,
        (Data, Extreme) => 600.0,

        (File, Trivial) => 10.0,
        (File, Low) => 30.0,
        (File, Medium) => 90.0,
        (File, High) => 180.0,
        (File, Extreme) => 360.0,

        (General, Trivial) => 15.0,
        (General, Low) => 45.0,
        (General, Medium) => 120.0,
        (General, High) => 300.0,
        (General, Extreme) => 600.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TimingStore;

    fn oracle_with_temp_store() -> (TimingOracle, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = TimingStore::new(dir.path().to_path_buf(), 50);
        let oracle = TimingOracle::new(store, TimingConfig::default());
        (oracle, dir)
    }

    #[test]
    fn unknown_command_floor_is_enforced() {
        let (oracle, _dir) = oracle_with_temp_store();
        // "xyz" has no keyword matches and is short -> General/Trivial,
        // zero samples -> confidence 0.0 -> floor applies.
        let decision = oracle.compute("xyz", 1);
        assert!(decision.max_seconds >= 600.0);
        assert!(decision.expected_seconds >= 600.0);
    }

    #[test]
    fn load_multiplier_triples_the_timeout_when_compounding() {
        let (oracle, _dir) = oracle_with_temp_store();
        let normal = oracle.compute("claude -p hello", 1);
        let loaded = oracle.compute("claude -p hello", 3);
        assert!((loaded.expected_seconds - normal.expected_seconds * 3.0).abs() < 1e-6);
    }

    #[test]
    fn history_with_three_plus_samples_uses_percentile() {
        let (oracle, _dir) = oracle_with_temp_store();
        for d in [10.0, 20.0, 30.0, 100.0] {
            oracle.record("claude -p hello", d, "normal");
        }
        let decision = oracle.compute("claude -p hello", 1);
        assert_eq!(decision.reason, "history");
        // 90th percentile of [10,20,30,100] (sorted) at rank ceil(0.9*4)=4 -> 100.0
        assert_eq!(decision.expected_seconds, 100.0);
    }

    #[test]
    fn classify_is_pure_and_deterministic_with_store_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let store = TimingStore::new(dir.path().join("unused"), 50);
        let oracle = TimingOracle::new(store, TimingConfig::default());
        let a = oracle.compute("claude -p hello", 1);
        let b = oracle.compute("claude -p hello", 1);
        assert_eq!(a, b);
    }

    #[test]
    fn non_compounding_takes_max_of_multipliers() {
        let dir = tempfile::tempdir().unwrap();
        let store = TimingStore::new(dir.path().to_path_buf(), 50);
        let mut config = TimingConfig::default();
        config.compound_multipliers = false;
        let oracle = TimingOracle::new(store, config);
        let loaded = oracle.compute("claude -p hello", 3);
        let normal = oracle.compute("claude -p hello", 1);
        assert_eq!(loaded.expected_seconds, normal.expected_seconds);
    }
}
