//! Process-group signal delivery for PAUSE/RESUME/CANCEL, via negative-PID
//! `libc::kill` targeting the whole group at once.

use std::time::Duration;
use tokio::process::Child;

/// Send `SIGSTOP` to the whole process group. `running -> paused`.
pub fn pause_group(pgid: i32) {
    signal_group(pgid, libc::SIGSTOP);
}

/// Send `SIGCONT` to the whole process group. `paused -> running`.
pub fn resume_group(pgid: i32) {
    signal_group(pgid, libc::SIGCONT);
}

/// Send `SIGTERM` to the whole process group (the graceful half of
/// CANCEL). Callers should follow up with [`force_kill_group`] if the
/// child has not exited after `grace_seconds`.
pub fn terminate_group(pgid: i32) {
    signal_group(pgid, libc::SIGTERM);
}

/// Send `SIGKILL` to the whole process group.
pub fn force_kill_group(pgid: i32) {
    signal_group(pgid, libc::SIGKILL);
}

fn signal_group(pgid: i32, signal: i32) {
    // SAFETY: kill() is async-signal-safe; a negative pid targets every
    // process in that process group.
    unsafe {
        libc::kill(-pgid, signal);
    }
}

/// Run the CANCEL sequence: terminate, wait up to `grace`, force-kill if
/// still alive, then reap. Returns once the child has exited.
pub async fn cancel_and_reap(child: &mut Child, pgid: i32, grace: Duration) {
    terminate_group(pgid);
    let waited = tokio::time::timeout(grace, child.wait()).await;
    if waited.is_err() {
        force_kill_group(pgid);
        let _ = child.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::CommandExt;
    use std::process::Stdio;
    use tokio::process::Command;

    fn spawn_in_own_group(shell_command: &str) -> Child {
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(shell_command)
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        unsafe {
            cmd.pre_exec(|| {
                libc::setsid();
                Ok(())
            });
        }
        cmd.spawn().unwrap()
    }

    #[tokio::test]
    async fn cancel_and_reap_terminates_a_sleeping_child_promptly() {
        let mut child = spawn_in_own_group("sleep 60");
        let pid = child.id().unwrap() as i32;

        let start = std::time::Instant::now();
        cancel_and_reap(&mut child, pid, Duration::from_secs(2)).await;
        assert!(start.elapsed() < Duration::from_secs(2));

        unsafe {
            // ESRCH (no such process) confirms it's gone.
            let ret = libc::kill(pid, 0);
            assert_eq!(ret, -1);
        }
    }

    #[tokio::test]
    async fn cancel_and_reap_force_kills_after_grace_if_sigterm_ignored() {
        let mut child = spawn_in_own_group("trap '' TERM; sleep 60");
        let pid = child.id().unwrap() as i32;

        let start = std::time::Instant::now();
        cancel_and_reap(&mut child, pid, Duration::from_millis(200)).await;
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
