//! Hook process execution: env-var contract plus two well-known files.
//!
//! Every hook process is a `sh -c` invocation run in its own process
//! group, killed as a group on timeout. It receives context as
//! environment variables rather than `{template}` substitution, because
//! hooks here act on a live subprocess rather than a fire-and-forget
//! one-shot command:
//!
//! - `CCE_HOOK_KIND` — the hook kind's config key (e.g. `pre_tool`)
//! - `CCE_SESSION_ID`, `CCE_COMMAND_ID` — identifiers for the in-flight command
//! - `CCE_COMMAND` — the command line about to run (or that just ran)
//! - `CCE_HOOK_TMPDIR` — a scratch directory, shared by every hook invocation
//!   for this command, holding two well-known files:
//!     - `wrapped_command` — a pre-execute hook may write a replacement
//!       command line here; the supervisor uses it verbatim if present.
//!     - `block` — any post-claude/post-tool hook may create this file to
//!       veto the command; its contents (if any) become the rejection
//!       reason. Presence is checked after every hook in the pre sequence
//!       and causes `precondition_failed` before the process is spawned.

use crate::config::Hook;
use crate::event::HookKind;
use std::io;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct HookContext<'a> {
    pub session_id: &'a str,
    pub command_id: &'a str,
    pub command: &'a str,
    pub tmpdir: &'a Path,
}

/// Outcome of a single hook run. Hooks are non-fatal by default: a nonzero
/// exit or timeout becomes a `Warning`, logged and surfaced to the client
/// as a `hook.warning` notification, but never aborts the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    Ok,
    Warning(String),
}

pub const WRAPPED_COMMAND_FILE: &str = "wrapped_command";
pub const BLOCK_FILE: &str = "block";

/// Run one hook to completion (or until its timeout), in a fresh process
/// group so the timeout path can reclaim the whole subtree.
pub async fn run_hook(
    kind: HookKind,
    hook: &Hook,
    context: &HookContext<'_>,
    global_timeout: Duration,
) -> io::Result<HookOutcome> {
    let timeout = hook.timeout(global_timeout);

    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(hook.command())
        .env("CCE_HOOK_KIND", kind.as_config_key())
        .env("CCE_SESSION_ID", context.session_id)
        .env("CCE_COMMAND_ID", context.command_id)
        .env("CCE_COMMAND", context.command)
        .env("CCE_HOOK_TMPDIR", context.tmpdir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // New process group so a timeout kill reclaims the whole subtree
    // instead of orphaning the hook's own children.
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }

    let mut child = cmd.spawn()?;
    let pid = child.id().ok_or_else(|| io::Error::other("hook process has no pid"))?;
    let start = Instant::now();

    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None => {
                if start.elapsed() >= timeout {
                    // SAFETY: kill() is async-signal-safe; negative pid
                    // targets the whole process group created above.
                    unsafe {
                        libc::kill(-(pid as i32), libc::SIGKILL);
                    }
                    let _ = child.wait().await;
                    return Ok(HookOutcome::Warning(format!(
                        "hook {} timed out after {}s",
                        kind.as_config_key(),
                        timeout.as_secs()
                    )));
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }
    };

    if status.success() {
        Ok(HookOutcome::Ok)
    } else {
        let code = status.code().unwrap_or(-1);
        Ok(HookOutcome::Warning(format!(
            "hook {} exited with code {code}",
            kind.as_config_key()
        )))
    }
}

/// Read a replacement command line written by a pre-execute hook, if any.
pub fn read_wrapped_command(tmpdir: &Path) -> Option<String> {
    let path = tmpdir.join(WRAPPED_COMMAND_FILE);
    std::fs::read_to_string(path).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Read the blocking sentinel written by a hook, if any. `Some(reason)`
/// where `reason` is the file's contents (or a generic message if empty).
pub fn read_block_reason(tmpdir: &Path) -> Option<String> {
    let path = tmpdir.join(BLOCK_FILE);
    if !path.exists() {
        return None;
    }
    let contents = std::fs::read_to_string(&path).unwrap_or_default();
    let reason = contents.trim();
    Some(if reason.is_empty() {
        "command blocked by hook".to_string()
    } else {
        reason.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Hook;

    fn ctx<'a>(tmpdir: &'a Path) -> HookContext<'a> {
        HookContext {
            session_id: "sess-1",
            command_id: "cmd-1",
            command: "echo hi",
            tmpdir,
        }
    }

    #[tokio::test]
    async fn successful_hook_returns_ok() {
        let dir = tempfile::tempdir().unwrap();
        let hook = Hook::Simple("exit 0".to_string());
        let outcome = run_hook(HookKind::PreExecute, &hook, &ctx(dir.path()), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(outcome, HookOutcome::Ok);
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_warning_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let hook = Hook::Simple("exit 7".to_string());
        let outcome = run_hook(HookKind::PostTool, &hook, &ctx(dir.path()), Duration::from_secs(5))
            .await
            .unwrap();
        match outcome {
            HookOutcome::Warning(msg) => assert!(msg.contains("code 7")),
            HookOutcome::Ok => panic!("expected warning"),
        }
    }

    #[tokio::test]
    async fn timeout_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let hook = Hook::Simple("sleep 5".to_string());
        let outcome = run_hook(HookKind::PreTool, &hook, &ctx(dir.path()), Duration::from_millis(100))
            .await
            .unwrap();
        match outcome {
            HookOutcome::Warning(msg) => assert!(msg.contains("timed out")),
            HookOutcome::Ok => panic!("expected timeout warning"),
        }
    }

    #[tokio::test]
    async fn env_vars_are_visible_to_the_hook() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let hook = Hook::Simple(format!("echo $CCE_SESSION_ID > {}", marker.display()));
        run_hook(HookKind::PreExecute, &hook, &ctx(dir.path()), Duration::from_secs(5))
            .await
            .unwrap();
        let content = std::fs::read_to_string(&marker).unwrap();
        assert_eq!(content.trim(), "sess-1");
    }

    #[test]
    fn read_wrapped_command_returns_none_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_wrapped_command(dir.path()), None);
    }

    #[test]
    fn read_wrapped_command_returns_trimmed_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(WRAPPED_COMMAND_FILE), "echo wrapped\n").unwrap();
        assert_eq!(read_wrapped_command(dir.path()), Some("echo wrapped".to_string()));
    }

    #[test]
    fn read_block_reason_absent_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_block_reason(dir.path()), None);
    }

    #[test]
    fn read_block_reason_empty_file_has_generic_message() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(BLOCK_FILE), "").unwrap();
        assert_eq!(read_block_reason(dir.path()), Some("command blocked by hook".to_string()));
    }

    #[test]
    fn read_block_reason_uses_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(BLOCK_FILE), "disallowed by policy\n").unwrap();
        assert_eq!(read_block_reason(dir.path()), Some("disallowed by policy".to_string()));
    }
}
