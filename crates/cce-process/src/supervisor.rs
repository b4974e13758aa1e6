//! Ties spawn, streaming, control signals, timeout, and token-limit
//! detection into the Child Process state machine.

use crate::control::{self, cancel_and_reap};
use crate::stream::{self, OutputFrame};
use crate::token_limit::{self, RecentOutputWindow};
use cce_core::{ProcessState, TerminationReason};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Child;
use tokio::sync::mpsc;

/// Control-plane commands accepted while a command is non-terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Pause,
    Resume,
    Cancel,
}

/// Outcome of a completed supervision run.
#[derive(Debug, Clone)]
pub struct Completion {
    pub exit_code: Option<i32>,
    pub reason: TerminationReason,
}

/// Tunables threaded through from `cce-config`.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub chunk_bytes: usize,
    pub max_line_bytes: usize,
    pub grace: Duration,
    pub token_limit_marker: String,
    pub recent_window_bytes: usize,
}

/// Lock-free snapshot of the state machine's current state, readable by
/// whoever owns a session's control surface without an async lock.
#[derive(Clone)]
pub struct StateHandle(Arc<AtomicU8>);

impl StateHandle {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(encode(ProcessState::Starting))))
    }

    pub fn get(&self) -> ProcessState {
        decode(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: ProcessState) {
        self.0.store(encode(state), Ordering::Release);
    }
}

fn encode(state: ProcessState) -> u8 {
    match state {
        ProcessState::Starting => 0,
        ProcessState::Running => 1,
        ProcessState::Paused => 2,
        ProcessState::Terminating => 3,
        ProcessState::Exited => 4,
    }
}

fn decode(byte: u8) -> ProcessState {
    match byte {
        0 => ProcessState::Starting,
        1 => ProcessState::Running,
        2 => ProcessState::Paused,
        3 => ProcessState::Terminating,
        _ => ProcessState::Exited,
    }
}

/// Drive one Child Process from `running` to `exited`, forwarding output
/// frames to `output_tx`, accepting control commands from `control_rx`,
/// and enforcing `max_seconds`. Returns once the child has been reaped —
/// no zombies are left.
pub async fn supervise(
    mut child: Child,
    pgid: i32,
    config: SupervisorConfig,
    max_seconds: f64,
    output_tx: mpsc::Sender<OutputFrame>,
    mut control_rx: mpsc::Receiver<ControlCommand>,
    state: StateHandle,
) -> Completion {
    state.set(ProcessState::Running);

    let stdout = child.stdout.take().expect("stdout must be piped");
    let stderr = child.stderr.take().expect("stderr must be piped");
    let (drain_tx, mut drain_rx) = mpsc::channel(1024);
    let drain_task = tokio::spawn(stream::drain(
        stdout,
        stderr,
        drain_tx,
        config.chunk_bytes,
        config.max_line_bytes,
    ));

    let mut window = RecentOutputWindow::new(config.recent_window_bytes);
    let deadline = Instant::now() + Duration::from_secs_f64(max_seconds.max(0.0));
    let mut token_limit_hit = false;
    let mut cancelled = false;
    let mut control_open = true;

    loop {
        tokio::select! {
            frame = drain_rx.recv() => {
                match frame {
                    Some(frame) => {
                        window.push(&frame.data);
                        if !token_limit_hit && token_limit::detect(&window, &config.token_limit_marker) {
                            token_limit_hit = true;
                        }
                        if output_tx.send(frame).await.is_err() {
                            // Client gone; fall through to cancellation below.
                            cancelled = true;
                            break;
                        }
                        if token_limit_hit {
                            break;
                        }
                    }
                    None => break, // both streams at EOF
                }
            }
            cmd = control_rx.recv(), if control_open => {
                match cmd {
                    Some(ControlCommand::Pause) if state.get() == ProcessState::Running => {
                        control::pause_group(pgid);
                        state.set(ProcessState::Paused);
                    }
                    Some(ControlCommand::Resume) if state.get() == ProcessState::Paused => {
                        control::resume_group(pgid);
                        state.set(ProcessState::Running);
                    }
                    Some(ControlCommand::Cancel) => {
                        cancelled = true;
                        break;
                    }
                    Some(_) => {} // no-op: e.g. Pause while already paused
                    None => control_open = false, // sender dropped; keep draining/waiting on the deadline
                }
            }
            _ = tokio::time::sleep_until(deadline.into()) => {
                break;
            }
        }
    }

    state.set(ProcessState::Terminating);

    // Either cancel/timeout/token-limit path needs a signal + grace-kill;
    // a child that exited naturally (both pipes closed, no signal
    // requested) still needs a final wait() to reap it.
    let reason = if token_limit_hit {
        cancel_and_reap(&mut child, pgid, config.grace).await;
        TerminationReason::TokenLimit
    } else if cancelled {
        cancel_and_reap(&mut child, pgid, config.grace).await;
        TerminationReason::Cancelled
    } else if Instant::now() >= deadline {
        cancel_and_reap(&mut child, pgid, config.grace).await;
        TerminationReason::Timeout
    } else {
        TerminationReason::Normal
    };

    // Drain any tail frames produced between the select loop breaking and
    // the signal landing, then always wait() to reap — even the Normal
    // path, since draining hitting EOF does not by itself wait().
    while let Ok(frame) = drain_rx.try_recv() {
        let _ = output_tx.send(frame).await;
    }
    let _ = drain_task.await;
    let status = child.wait().await.ok();

    state.set(ProcessState::Exited);

    let exit_code = status.and_then(|s| {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            s.code().or_else(|| s.signal().map(|sig| -sig))
        }
        #[cfg(not(unix))]
        {
            s.code()
        }
    });

    Completion { exit_code, reason }
}

pub fn new_state_handle() -> StateHandle {
    StateHandle::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::{self, CommandSpec};
    use std::collections::HashMap;

    fn default_config() -> SupervisorConfig {
        SupervisorConfig {
            chunk_bytes: 64 * 1024,
            max_line_bytes: 1024 * 1024,
            grace: Duration::from_secs(2),
            token_limit_marker: "token limit exceeded".to_string(),
            recent_window_bytes: 64 * 1024,
        }
    }

    async fn spawn_sh(script: &str) -> (Child, i32) {
        let spec = CommandSpec::structured("sh", vec!["-c".to_string(), script.to_string()]);
        let path = spawn::resolve(&spec).unwrap();
        let child = spawn::spawn(&spec, &path, &HashMap::new(), None, "s1", "c1").unwrap();
        let pid = child.id().unwrap() as i32;
        (child, pid)
    }

    #[tokio::test]
    async fn natural_exit_reports_normal_and_exit_code() {
        let (child, pgid) = spawn_sh("echo hi; exit 0").await;
        let (out_tx, mut out_rx) = mpsc::channel(16);
        let (_ctrl_tx, ctrl_rx) = mpsc::channel(4);
        let state = new_state_handle();

        let completion = supervise(child, pgid, default_config(), 30.0, out_tx, ctrl_rx, state.clone()).await;

        assert_eq!(completion.exit_code, Some(0));
        assert!(matches!(completion.reason, TerminationReason::Normal));
        assert_eq!(state.get(), ProcessState::Exited);
        assert!(out_rx.recv().await.is_some());

        // No zombie: a wait() with WNOHANG-equivalent poll should find nothing.
        unsafe {
            assert_eq!(libc::kill(pgid, 0), -1);
        }
    }

    #[tokio::test]
    async fn cancel_command_transitions_to_cancelled() {
        let (child, pgid) = spawn_sh("sleep 30").await;
        let (out_tx, _out_rx) = mpsc::channel(16);
        let (ctrl_tx, ctrl_rx) = mpsc::channel(4);
        let state = new_state_handle();

        ctrl_tx.send(ControlCommand::Cancel).await.unwrap();
        let completion = supervise(child, pgid, default_config(), 60.0, out_tx, ctrl_rx, state).await;

        assert!(matches!(completion.reason, TerminationReason::Cancelled));
    }

    #[tokio::test]
    async fn timeout_is_enforced_when_max_seconds_elapses() {
        let (child, pgid) = spawn_sh("sleep 30").await;
        let (out_tx, _out_rx) = mpsc::channel(16);
        let (_ctrl_tx, ctrl_rx) = mpsc::channel(4);
        let state = new_state_handle();

        let completion = supervise(child, pgid, default_config(), 0.05, out_tx, ctrl_rx, state).await;
        assert!(matches!(completion.reason, TerminationReason::Timeout));
    }

    #[tokio::test]
    async fn token_limit_marker_ends_the_command_with_token_limit_reason() {
        let (child, pgid) = spawn_sh("echo 'sorry, token limit exceeded'; sleep 30").await;
        let (out_tx, mut out_rx) = mpsc::channel(16);
        let (_ctrl_tx, ctrl_rx) = mpsc::channel(4);
        let state = new_state_handle();

        let completion = supervise(child, pgid, default_config(), 30.0, out_tx, ctrl_rx, state).await;
        assert!(matches!(completion.reason, TerminationReason::TokenLimit));
        assert!(out_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn pause_then_resume_round_trips_state() {
        let (child, pgid) = spawn_sh("sleep 2; echo done").await;
        let (out_tx, _out_rx) = mpsc::channel(16);
        let (ctrl_tx, ctrl_rx) = mpsc::channel(4);
        let state = new_state_handle();

        ctrl_tx.send(ControlCommand::Pause).await.unwrap();
        ctrl_tx.send(ControlCommand::Resume).await.unwrap();

        let completion = supervise(child, pgid, default_config(), 30.0, out_tx, ctrl_rx, state).await;
        assert!(matches!(completion.reason, TerminationReason::Normal));
    }
}
