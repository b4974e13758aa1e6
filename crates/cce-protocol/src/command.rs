//! Request dispatch and the `execute` lifecycle: admission, hooks,
//! timing, spawn, streaming, and the post-hook/record tail.

use crate::admission;
use crate::app::AppState;
use crate::notify;
use crate::rpc::{parse_control_params, parse_execute_params, ControlKind, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use crate::session::{ActiveCommand, Session};
use cce_core::{AppError, CommandId};
use cce_process::{spawn, CommandSpec};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// How long a stalled writer is tolerated before the session is torn
/// down with `backpressure_overflow`. Not a configuration option.
const BACKPRESSURE_GRACE: Duration = Duration::from_secs(5);

fn try_send_json<T: Serialize>(session: &Session, value: &T) -> bool {
    match serde_json::to_string(value) {
        Ok(text) => session.outgoing.try_send(text).is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize outgoing frame");
            false
        }
    }
}

fn send_response(session: &Session, resp: &JsonRpcResponse) {
    try_send_json(session, resp);
}

fn send_notification(session: &Session, note: &JsonRpcNotification) -> bool {
    try_send_json(session, note)
}

/// Lossy, display-only rendering of a `CommandSpec` for hook context and
/// timing classification. Hooks and the classifier only need to *see*
/// the command, never re-tokenize it — the structured form remains the
/// source of truth for what is actually spawned.
fn display_command(spec: &CommandSpec) -> String {
    let mut parts = vec![spec.executable.clone()];
    parts.extend(spec.args.iter().cloned());
    parts.join(" ")
}

pub async fn handle_incoming(text: &str, session: &Arc<Session>, state: &Arc<AppState>) {
    let request: JsonRpcRequest = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            let resp = JsonRpcResponse::err(
                CommandId::String("unknown".to_string()),
                AppError::InvalidRequest(e.to_string()).into(),
            );
            send_response(session, &resp);
            return;
        }
    };

    let id = request.id;
    match request.method.as_str() {
        "execute" => handle_execute(id, request.params, session.clone(), state.clone()).await,
        "control" => handle_control(id, request.params, session).await,
        "hook_status" => handle_hook_status(id, session, state).await,
        other => {
            send_response(session, &JsonRpcResponse::err(id, AppError::MethodNotFound(other.to_string()).into()));
        }
    }
}

async fn handle_execute(id: CommandId, params: Option<serde_json::Value>, session: Arc<Session>, state: Arc<AppState>) {
    let parsed = match parse_execute_params(params) {
        Ok(p) => p,
        Err(e) => {
            send_response(&session, &JsonRpcResponse::err(id, e.into()));
            return;
        }
    };

    {
        let active = session.active.lock().await;
        if let Some(ac) = active.as_ref() {
            if !ac.state.get().is_terminal() {
                send_response(&session, &JsonRpcResponse::err(id, AppError::CommandInProgress.into()));
                return;
            }
        }
    }

    let spec = match parsed.to_command_spec() {
        Ok(s) => s,
        Err(e) => {
            send_response(&session, &JsonRpcResponse::err(id, e.into()));
            return;
        }
    };

    if !admission::is_allowed(&spec, &state.config.allowed_executables) {
        send_response(&session, &JsonRpcResponse::err(id, AppError::CommandNotAllowed(spec.executable.clone()).into()));
        return;
    }

    if let Some(warning) = admission::validation_warning(&display_command(&spec)) {
        send_notification(&session, &notify::command_validation_warning(warning));
    }

    let command_id_str = id.to_string();
    let session_id_str = session.id.to_string();
    let scratch = match cce_hooks::scratch_dir() {
        Ok(d) => d,
        Err(e) => {
            send_response(&session, &JsonRpcResponse::err(id, AppError::Internal(e.to_string()).into()));
            return;
        }
    };

    let original_display = display_command(&spec);
    let targets_llm_cli = cce_timing::is_llm_cli(&spec.executable);
    let hook_ctx = cce_hooks::context(&session_id_str, &command_id_str, &original_display, scratch.path());

    let pre_result =
        cce_hooks::run_pre_hooks(&state.hooks, &hook_ctx, state.config.global_hook_timeout, targets_llm_cli).await;

    let (final_display, pre_warnings) = match pre_result {
        cce_hooks::PreHookResult::Blocked { reason, warnings } => {
            for w in &warnings {
                send_notification(&session, &notify::hook_warning(w.clone()));
            }
            send_response(&session, &JsonRpcResponse::err(id, AppError::PreconditionFailed(reason).into()));
            return;
        }
        cce_hooks::PreHookResult::Proceed { command, warnings } => (command, warnings),
    };

    let final_spec = if final_display == original_display {
        spec
    } else {
        match CommandSpec::from_raw(&final_display) {
            Ok(s) => s,
            Err(e) => {
                send_response(&session, &JsonRpcResponse::err(id, e.into()));
                return;
            }
        }
    };

    if !admission::is_allowed(&final_spec, &state.config.allowed_executables) {
        send_response(&session, &JsonRpcResponse::err(id, AppError::CommandNotAllowed(final_spec.executable.clone()).into()));
        return;
    }

    let resolved_path = match spawn::resolve(&final_spec) {
        Ok(p) => p,
        Err(e) => {
            send_response(&session, &JsonRpcResponse::err(id, e.into()));
            return;
        }
    };

    let load_multiplier =
        cce_resource::multiplier_with(state.config.load_threshold_pct, state.config.load_multiplier).await;
    let timing_command = display_command(&final_spec);
    let decision = state.timing.compute(&timing_command, load_multiplier);
    let max_seconds = parsed.timeout().unwrap_or(decision.max_seconds);

    let env_overrides = parsed.env();
    let child = match spawn::spawn(&final_spec, &resolved_path, &env_overrides, None, &session_id_str, &command_id_str) {
        Ok(c) => c,
        Err(e) => {
            send_response(&session, &JsonRpcResponse::err(id, AppError::Internal(e.to_string()).into()));
            return;
        }
    };

    let pid = child.id().unwrap_or(0);
    let pgid = pid as i32;

    send_response(&session, &JsonRpcResponse::ok(id, serde_json::json!({ "status": "started", "pid": pid, "pgid": pgid })));
    send_notification(&session, &notify::process_started(pid, pgid));
    for w in &pre_warnings {
        send_notification(&session, &notify::hook_warning(w.clone()));
    }

    let (control_tx, control_rx) = mpsc::channel(8);
    let state_handle = cce_process::new_state_handle();
    {
        let mut active = session.active.lock().await;
        *active = Some(ActiveCommand { pid, pgid, control_tx, state: state_handle.clone() });
    }

    let supervisor_config = cce_process::SupervisorConfig {
        chunk_bytes: state.config.stream_chunk_bytes,
        max_line_bytes: state.config.max_line_bytes,
        grace: Duration::from_secs_f64(state.config.grace_seconds),
        token_limit_marker: state.config.token_limit_marker.clone(),
        recent_window_bytes: state.config.recent_frame_bytes,
    };

    tokio::spawn(run_command_lifecycle(
        session,
        state,
        child,
        pgid,
        pid,
        supervisor_config,
        max_seconds,
        scratch,
        session_id_str,
        command_id_str,
        timing_command,
        targets_llm_cli,
        control_rx,
        state_handle,
    ));
}

#[allow(clippy::too_many_arguments)]
async fn run_command_lifecycle(
    session: Arc<Session>,
    state: Arc<AppState>,
    child: tokio::process::Child,
    pgid: i32,
    pid: u32,
    config: cce_process::SupervisorConfig,
    max_seconds: f64,
    scratch: tempfile::TempDir,
    session_id_str: String,
    command_id_str: String,
    command_str: String,
    targets_llm_cli: bool,
    control_rx: mpsc::Receiver<cce_process::ControlCommand>,
    state_handle: cce_process::StateHandle,
) {
    let (output_tx, mut output_rx) = mpsc::channel(1024);
    let started_at = Instant::now();

    let forward_session = session.clone();
    let forward_task = tokio::spawn(async move {
        let mut backpressure_since: Option<Instant> = None;
        while let Some(frame) = output_rx.recv().await {
            let note = notify::process_output(&frame);
            if send_notification(&forward_session, &note) {
                backpressure_since = None;
                continue;
            }
            let since = *backpressure_since.get_or_insert_with(Instant::now);
            if since.elapsed() >= BACKPRESSURE_GRACE {
                send_notification(&forward_session, &notify::backpressure_overflow());
                break;
            }
        }
    });

    let heartbeat_session = session.clone();
    let heartbeat_seconds = state.config.heartbeat_seconds.max(0.1);
    let heartbeat_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs_f64(heartbeat_seconds));
        interval.tick().await; // first tick fires immediately; nothing to report yet
        loop {
            interval.tick().await;
            if !send_notification(&heartbeat_session, &notify::heartbeat()) {
                break;
            }
        }
    });

    let completion = cce_process::supervise(child, pgid, config, max_seconds, output_tx, control_rx, state_handle).await;

    heartbeat_task.abort();
    let _ = forward_task.await;

    let duration_seconds = started_at.elapsed().as_secs_f64();
    let outcome = match completion.reason {
        cce_core::TerminationReason::Normal => "normal",
        cce_core::TerminationReason::Cancelled => "cancelled",
        cce_core::TerminationReason::Timeout => "timeout",
        cce_core::TerminationReason::TokenLimit => "token_limit",
        cce_core::TerminationReason::InternalError => "internal_error",
    };
    state.timing.record(&command_str, duration_seconds, outcome);

    let hook_ctx = cce_hooks::context(&session_id_str, &command_id_str, &command_str, scratch.path());
    let post_warnings =
        cce_hooks::run_post_hooks(&state.hooks, &hook_ctx, state.config.global_hook_timeout, targets_llm_cli).await;
    for w in &post_warnings {
        send_notification(&session, &notify::hook_warning(w.clone()));
    }

    if matches!(completion.reason, cce_core::TerminationReason::TokenLimit) {
        send_notification(&session, &notify::token_limit_exceeded("shorten the prompt or start a new session"));
    }

    send_notification(&session, &notify::process_completed(pid, pgid, completion.exit_code, completion.reason));

    {
        let mut active = session.active.lock().await;
        *active = None;
    }
    drop(scratch);
}

async fn handle_control(id: CommandId, params: Option<serde_json::Value>, session: &Arc<Session>) {
    let control = match parse_control_params(params) {
        Ok(c) => c,
        Err(e) => {
            send_response(session, &JsonRpcResponse::err(id, e.into()));
            return;
        }
    };

    let active = session.active.lock().await;
    let ac = match active.as_ref() {
        Some(ac) if !ac.state.get().is_terminal() => ac,
        _ => {
            send_response(
                session,
                &JsonRpcResponse::err(id, AppError::InvalidParams("no active command on this session".to_string()).into()),
            );
            return;
        }
    };

    let (cmd, status, note) = match control.kind {
        ControlKind::Pause => (cce_process::ControlCommand::Pause, "paused", notify::process_paused(ac.pid, ac.pgid)),
        ControlKind::Resume => (cce_process::ControlCommand::Resume, "resumed", notify::process_resumed(ac.pid, ac.pgid)),
        ControlKind::Cancel => (cce_process::ControlCommand::Cancel, "cancelled", notify::process_cancelled(ac.pid, ac.pgid)),
    };
    let _ = ac.control_tx.send(cmd).await;
    drop(active);

    send_response(session, &JsonRpcResponse::ok(id, serde_json::json!({ "status": status })));
    send_notification(session, &note);
}

async fn handle_hook_status(id: CommandId, session: &Arc<Session>, state: &Arc<AppState>) {
    let hooks_configured = admission::configured_hook_kinds(&state.hooks);
    let result = serde_json::json!({
        "enabled": !hooks_configured.is_empty(),
        "hooks_configured": hooks_configured,
        "recent_executions": Vec::<serde_json::Value>::new(),
        "statistics": {},
    });
    send_response(session, &JsonRpcResponse::ok(id, result));
}

/// Cancel any active command and wait for the cancel to be enqueued
/// (not for the command to actually finish — the lifecycle task keeps
/// the session's outgoing channel alive until it sends `process.completed`).
pub async fn cancel_active(session: &Arc<Session>) {
    let active = session.active.lock().await;
    if let Some(ac) = active.as_ref() {
        let _ = ac.control_tx.send(cce_process::ControlCommand::Cancel).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_command_joins_executable_and_args() {
        let spec = CommandSpec::structured("echo", vec!["a".to_string(), "b c".to_string()]);
        assert_eq!(display_command(&spec), "echo a b c");
    }
}
