// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Subprocess execution with a deadline

use std::io;
use std::process::{Child, Command};
use std::thread;
use std::time::{Duration, Instant};

const MIN_POLL: Duration = Duration::from_millis(2);
const MAX_POLL: Duration = Duration::from_millis(50);

/// How a child process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Exited on its own. `code` is `None` when killed by a signal.
    Exited { code: Option<i32>, elapsed: Duration },
    /// Deadline passed; the child was killed and reaped
    TimedOut { elapsed: Duration },
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        matches!(self, ProcessOutcome::Exited { code: Some(0), .. })
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            ProcessOutcome::Exited { elapsed, .. } | ProcessOutcome::TimedOut { elapsed } => *elapsed,
        }
    }
}

/// Spawn `command` and wait for it at most `timeout`.
///
/// The child is always reaped before returning, including on timeout. On
/// unix it runs in its own process group and a timeout kills the whole
/// group, so wrapper scripts cannot leave the real renderer behind.
pub fn run_with_timeout(command: &mut Command, timeout: Duration) -> io::Result<ProcessOutcome> {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let start = Instant::now();
    let mut child = command.spawn()?;
    // None when the timeout is too large to represent; wait without a deadline
    let deadline = start.checked_add(timeout);
    let mut poll = MIN_POLL;

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                return Ok(ProcessOutcome::Exited {
                    code: status.code(),
                    elapsed: start.elapsed(),
                });
            }
            Ok(None) => {}
            Err(e) => {
                terminate(&mut child);
                return Err(e);
            }
        }

        let now = Instant::now();
        let nap = match deadline {
            Some(deadline) if now >= deadline => {
                terminate(&mut child);
                return Ok(ProcessOutcome::TimedOut {
                    elapsed: start.elapsed(),
                });
            }
            Some(deadline) => poll.min(deadline - now),
            None => poll,
        };

        thread::sleep(nap);
        poll = (poll * 2).min(MAX_POLL);
    }
}

fn terminate(child: &mut Child) {
    kill(child);
    if let Err(e) = child.wait() {
        tracing::warn!(pid = child.id(), error = %e, "failed to reap engine process");
    }
}

#[cfg(unix)]
fn kill(child: &mut Child) {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        kill_direct(child);
        return;
    };
    // SAFETY: plain syscall. The group leader is our unreaped child, so the
    // group id cannot have been recycled.
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } != 0 {
        let e = io::Error::last_os_error();
        if e.raw_os_error() != Some(libc::ESRCH) {
            tracing::warn!(pgid, error = %e, "failed to kill engine process group");
        }
        kill_direct(child);
    }
}

#[cfg(not(unix))]
fn kill(child: &mut Child) {
    kill_direct(child);
}

fn kill_direct(child: &mut Child) {
    if let Err(e) = child.kill() {
        // InvalidInput means it already exited
        if e.kind() != io::ErrorKind::InvalidInput {
            tracing::warn!(pid = child.id(), error = %e, "failed to kill engine process");
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_reported() {
        let outcome = run_with_timeout(
            Command::new("sh").args(["-c", "exit 3"]),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            outcome,
            ProcessOutcome::Exited {
                code: Some(3),
                elapsed: outcome.elapsed()
            }
        );
        assert!(!outcome.success());
    }

    #[test]
    fn test_timeout_kills_child() {
        let start = Instant::now();
        let outcome = run_with_timeout(
            Command::new("sh").args(["-c", "sleep 30"]),
            Duration::from_millis(100),
        )
        .unwrap();
        assert!(matches!(outcome, ProcessOutcome::TimedOut { .. }));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_huge_timeout_does_not_overflow() {
        let outcome = run_with_timeout(
            Command::new("sh").args(["-c", "exit 0"]),
            Duration::from_secs(u64::MAX / 2),
        )
        .unwrap();
        assert!(outcome.success());
        assert!(run_with_timeout(&mut Command::new("true"), Duration::MAX)
            .unwrap()
            .success());
    }

    /// True while `pid` exists and is not a zombie
    #[cfg(target_os = "linux")]
    fn is_running(pid: u32) -> bool {
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => stat
                .rsplit_once(") ")
                .map(|(_, rest)| !rest.starts_with('Z'))
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_timeout_kills_grandchildren() {
        let dir = tempfile::TempDir::new().unwrap();
        let pid_file = dir.path().join("sleeper.pid");
        let script = format!("sleep 30 & echo $! > {}; wait", pid_file.display());

        let outcome = run_with_timeout(
            Command::new("sh").args(["-c", &script]),
            Duration::from_millis(300),
        )
        .unwrap();
        assert!(matches!(outcome, ProcessOutcome::TimedOut { .. }));

        let pid: u32 = std::fs::read_to_string(&pid_file)
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        let gone_by = Instant::now() + Duration::from_secs(5);
        while is_running(pid) && Instant::now() < gone_by {
            thread::sleep(Duration::from_millis(20));
        }
        assert!(!is_running(pid), "background sleep {} survived the timeout", pid);
    }

    #[test]
    fn test_missing_executable_is_spawn_error() {
        let err = run_with_timeout(
            &mut Command::new("/nonexistent/scadview-engine"),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
