//! Closed error taxonomy for CC Executor.
//!
//! Every variant maps onto exactly one JSON-RPC error code from the
//! protocol's closed set (see [`crate::rpc_error::JsonRpcErrorCode`]).

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("malformed JSON-RPC request: {0}")]
    InvalidRequest(String),

    #[error("unknown method '{0}'")]
    MethodNotFound(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("a command is already in progress on this session")]
    CommandInProgress,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("executable '{0}' is not in the allow-list")]
    CommandNotAllowed(String),

    #[error("executable '{0}' was not found on PATH")]
    CommandNotFound(String),

    #[error("blocking pre-hook reported failure: {0}")]
    PreconditionFailed(String),

    #[error("token quota exceeded")]
    TokenLimitExceeded { suggestion: String },

    #[error("session torn down: writer lagged past the high-water mark")]
    BackpressureOverflow,
}
