//! Timing oracle: classification, history lookup, and timeout math.

pub mod classify;
pub mod oracle;
pub mod store;

pub use classify::{classify, is_llm_cli, CommandClass, Complexity};
pub use oracle::{TimingConfig, TimingDecision, TimingOracle};
pub use store::{TimingSample, TimingStore};
