//! Session and command identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Opaque session identifier, generated on WebSocket accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Ulid);

impl SessionId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Command identifier, taken verbatim from the JSON-RPC request `id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandId {
    Number(i64),
    String(String),
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandId::Number(n) => write!(f, "{n}"),
            CommandId::String(s) => write!(f, "{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn command_id_roundtrips_string_and_number() {
        let as_str: CommandId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(as_str, CommandId::String("abc".into()));
        let as_num: CommandId = serde_json::from_str("42").unwrap();
        assert_eq!(as_num, CommandId::Number(42));
    }
}
