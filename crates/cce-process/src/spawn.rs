//! Command resolution and process-group spawn.

use crate::tokenize::split_words;
use cce_core::AppError;
use std::collections::HashMap;
use std::io;
use std::os::unix::process::CommandExt;
use tokio::process::{Child, Command};

/// A command decomposed into executable + arguments — the preferred,
/// unambiguous form over a raw string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub executable: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn structured(executable: impl Into<String>, args: Vec<String>) -> Self {
        Self { executable: executable.into(), args }
    }

    /// Tokenize a raw command string with quote-aware word splitting. No
    /// shell is ever invoked.
    pub fn from_raw(command: &str) -> Result<Self, AppError> {
        let words = split_words(command)
            .ok_or_else(|| AppError::InvalidParams("unterminated quote in command".to_string()))?;
        let mut iter = words.into_iter();
        let executable = iter
            .next()
            .ok_or_else(|| AppError::InvalidParams("command is empty".to_string()))?;
        Ok(Self { executable, args: iter.collect() })
    }

    /// The bare first word, used for allow-list checks regardless of
    /// whether the request arrived structured or raw.
    pub fn allow_list_key(&self) -> &str {
        &self.executable
    }
}

/// Resolve `spec.executable` against `PATH`. Fails fast with
/// `command_not_found` rather than letting `Command::spawn` fail later
/// with an OS-level error the client cannot act on.
pub fn resolve(spec: &CommandSpec) -> Result<std::path::PathBuf, AppError> {
    which::which(&spec.executable)
        .map_err(|_| AppError::CommandNotFound(spec.executable.clone()))
}

/// Spawn `spec` in a fresh process group (PGID == PID), stdin closed
/// (connected to a null sink, preventing a recurring class of hangs
/// where a child blocks waiting for input that will never arrive),
/// stdout/stderr piped.
pub fn spawn(
    spec: &CommandSpec,
    resolved_path: &std::path::Path,
    env_overrides: &HashMap<String, String>,
    working_dir: Option<&std::path::Path>,
    session_id: &str,
    command_id: &str,
) -> io::Result<Child> {
    let mut cmd = Command::new(resolved_path);
    cmd.args(&spec.args)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true)
        .env("CCE_SESSION_ID", session_id)
        .env("CCE_COMMAND_ID", command_id);

    for (key, value) in env_overrides {
        cmd.env(key, value);
    }
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    // SAFETY: setsid() is async-signal-safe and runs in the child after
    // fork, before exec. It fails only if the calling process is already
    // a process group leader, which a freshly forked child never is.
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }

    cmd.spawn()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_splits_executable_and_args() {
        let spec = CommandSpec::from_raw("echo hello world").unwrap();
        assert_eq!(spec.executable, "echo");
        assert_eq!(spec.args, vec!["hello".to_string(), "world".to_string()]);
    }

    #[test]
    fn from_raw_rejects_empty_command() {
        assert!(CommandSpec::from_raw("   ").is_err());
    }

    #[test]
    fn resolve_fails_fast_for_unknown_executable() {
        let spec = CommandSpec::structured("definitely-not-a-real-binary-xyz", vec![]);
        let err = resolve(&spec).unwrap_err();
        assert!(matches!(err, AppError::CommandNotFound(_)));
    }

    #[test]
    fn resolve_finds_a_real_binary() {
        let spec = CommandSpec::structured("sh", vec![]);
        assert!(resolve(&spec).is_ok());
    }

    #[tokio::test]
    async fn spawn_sets_a_new_process_group() {
        let spec = CommandSpec::structured("sh", vec!["-c".to_string(), "exit 0".to_string()]);
        let path = resolve(&spec).unwrap();
        let mut child = spawn(&spec, &path, &HashMap::new(), None, "s1", "c1").unwrap();
        let pid = child.id().unwrap();
        unsafe {
            let pgid = libc::getpgid(pid as i32);
            assert_eq!(pgid, pid as i32);
        }
        let _ = child.wait().await;
    }
}
