//! Shared types for CC Executor: identifiers, the error taxonomy, and the
//! JSON-RPC error code mapping used across every other `cce-*` crate.

pub mod error;
pub mod ids;
pub mod rpc_error;
pub mod termination;

pub use error::AppError;
pub use ids::{CommandId, SessionId};
pub use rpc_error::{JsonRpcError, JsonRpcErrorCode};
pub use termination::{ProcessState, StreamKind, TerminationReason};
