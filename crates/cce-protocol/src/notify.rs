//! Builders for every server-pushed notification kind. Each is a thin
//! wrapper over `serde_json::json!` producing a `JsonRpcNotification` —
//! plain structs serialized directly, with `chrono::DateTime<Utc>`
//! timestamps where a notification carries one.

use crate::rpc::JsonRpcNotification;
use cce_core::{SessionId, TerminationReason};
use cce_process::OutputFrame;
use serde_json::json;

pub fn connected(session_id: SessionId, version: &str) -> JsonRpcNotification {
    JsonRpcNotification::new(
        "connected",
        json!({ "session_id": session_id.to_string(), "version": version }),
    )
}

pub fn process_started(pid: u32, pgid: i32) -> JsonRpcNotification {
    JsonRpcNotification::new("process.started", json!({ "pid": pid, "pgid": pgid }))
}

pub fn process_paused(pid: u32, pgid: i32) -> JsonRpcNotification {
    JsonRpcNotification::new("process.paused", json!({ "pid": pid, "pgid": pgid }))
}

pub fn process_resumed(pid: u32, pgid: i32) -> JsonRpcNotification {
    JsonRpcNotification::new("process.resumed", json!({ "pid": pid, "pgid": pgid }))
}

pub fn process_cancelled(pid: u32, pgid: i32) -> JsonRpcNotification {
    JsonRpcNotification::new("process.cancelled", json!({ "pid": pid, "pgid": pgid }))
}

fn reason_str(reason: TerminationReason) -> &'static str {
    match reason {
        TerminationReason::Normal => "normal",
        TerminationReason::Cancelled => "cancelled",
        TerminationReason::Timeout => "timeout",
        TerminationReason::TokenLimit => "token_limit",
        TerminationReason::InternalError => "internal_error",
    }
}

pub fn process_completed(
    pid: u32,
    pgid: i32,
    exit_code: Option<i32>,
    reason: TerminationReason,
) -> JsonRpcNotification {
    JsonRpcNotification::new(
        "process.completed",
        json!({ "pid": pid, "pgid": pgid, "exit_code": exit_code, "reason": reason_str(reason) }),
    )
}

pub fn process_output(frame: &OutputFrame) -> JsonRpcNotification {
    JsonRpcNotification::new(
        "process.output",
        json!({ "stream": frame.stream, "data": frame.data, "truncated": frame.truncated }),
    )
}

pub fn heartbeat() -> JsonRpcNotification {
    JsonRpcNotification::new("heartbeat", json!({ "timestamp": chrono::Utc::now() }))
}

pub fn hook_warning(message: String) -> JsonRpcNotification {
    JsonRpcNotification::new("hook.warning", json!({ "message": message }))
}

pub fn command_validation_warning(message: String) -> JsonRpcNotification {
    JsonRpcNotification::new("command.validation_warning", json!({ "message": message }))
}

pub fn token_limit_exceeded(suggestion: &str) -> JsonRpcNotification {
    JsonRpcNotification::new(
        "error.token_limit_exceeded",
        json!({ "suggestion": suggestion, "recoverable": true }),
    )
}

pub fn backpressure_overflow() -> JsonRpcNotification {
    JsonRpcNotification::new(
        "error.backpressure_overflow",
        json!({ "message": "session torn down: writer lagged past the high-water mark" }),
    )
}
