//! JSON-RPC error code mapping (spec §6, closed set).

use crate::error::AppError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum JsonRpcErrorCode {
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,
    CommandNotAllowed = -32000,
    CommandNotFound = -32001,
    PreconditionFailed = -32002,
    TokenLimitExceeded = -32003,
    BackpressureOverflow = -32004,
}

impl JsonRpcErrorCode {
    pub fn code(self) -> i64 {
        self as i64
    }
}

/// Wire-format JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Maps every `AppError` variant onto its wire error. This match is
/// exhaustive by construction: adding an `AppError` variant without
/// extending this match is a compile error, which is what keeps the
/// Rust-level taxonomy and the JSON-RPC closed set from drifting apart.
impl From<&AppError> for JsonRpcError {
    fn from(err: &AppError) -> Self {
        let (code, data) = match err {
            AppError::InvalidRequest(_) => (JsonRpcErrorCode::InvalidRequest, None),
            AppError::MethodNotFound(_) => (JsonRpcErrorCode::MethodNotFound, None),
            AppError::InvalidParams(_) => (JsonRpcErrorCode::InvalidParams, None),
            AppError::CommandInProgress => (JsonRpcErrorCode::InvalidParams, None),
            AppError::Internal(_) => (JsonRpcErrorCode::InternalError, None),
            AppError::CommandNotAllowed(_) => (JsonRpcErrorCode::CommandNotAllowed, None),
            AppError::CommandNotFound(_) => (JsonRpcErrorCode::CommandNotFound, None),
            AppError::PreconditionFailed(_) => (JsonRpcErrorCode::PreconditionFailed, None),
            AppError::TokenLimitExceeded { suggestion } => (
                JsonRpcErrorCode::TokenLimitExceeded,
                Some(serde_json::json!({ "suggestion": suggestion, "recoverable": true })),
            ),
            AppError::BackpressureOverflow => (JsonRpcErrorCode::BackpressureOverflow, None),
        };

        JsonRpcError {
            code: code.code(),
            message: err.to_string(),
            data,
        }
    }
}

impl From<AppError> for JsonRpcError {
    fn from(err: AppError) -> Self {
        JsonRpcError::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_in_progress_maps_to_invalid_params() {
        let rpc_err: JsonRpcError = AppError::CommandInProgress.into();
        assert_eq!(rpc_err.code, JsonRpcErrorCode::InvalidParams.code());
    }

    #[test]
    fn token_limit_carries_suggestion_payload() {
        let rpc_err: JsonRpcError = AppError::TokenLimitExceeded {
            suggestion: "shorten the prompt".into(),
        }
        .into();
        assert_eq!(rpc_err.code, -32003);
        let data = rpc_err.data.expect("data present");
        assert_eq!(data["suggestion"], "shorten the prompt");
        assert_eq!(data["recoverable"], true);
    }

    #[test]
    fn command_not_found_maps_to_dedicated_code() {
        let rpc_err: JsonRpcError = AppError::CommandNotFound("frobnicate".into()).into();
        assert_eq!(rpc_err.code, -32001);
    }
}
