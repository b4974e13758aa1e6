//! Shared child-process lifecycle types.

use serde::{Deserialize, Serialize};

/// Why a Child Process reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    Normal,
    Cancelled,
    Timeout,
    TokenLimit,
    InternalError,
}

/// Child Process state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    Starting,
    Running,
    Paused,
    Terminating,
    Exited,
}

impl ProcessState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessState::Exited)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Stdout,
    Stderr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exited_is_terminal() {
        assert!(ProcessState::Exited.is_terminal());
        assert!(!ProcessState::Starting.is_terminal());
        assert!(!ProcessState::Running.is_terminal());
        assert!(!ProcessState::Paused.is_terminal());
        assert!(!ProcessState::Terminating.is_terminal());
    }

    #[test]
    fn termination_reason_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&TerminationReason::TokenLimit).unwrap(),
            "\"token_limit\""
        );
    }
}
