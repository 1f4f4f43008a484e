// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process Supervisor: spawns a child into its own process group, checks
//! liveness against the OS, and reaps a whole process tree on termination.

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to spawn child process: {0}")]
    Spawn(#[source] std::io::Error),
}

/// How long `kill_tree` waits for a graceful exit before forcing one.
pub const REAP_TIMEOUT: Duration = Duration::from_secs(5);

/// Spawn `program` with `args`, in `cwd`, with the given environment,
/// redirecting stdout/stderr to `log_sink` (cloned). The child is placed
/// in a new process group so `kill_tree` can signal the whole descendant
/// tree at once.
pub fn spawn_in_new_group(
    program: &str,
    args: &[String],
    cwd: &std::path::Path,
    env: &[(String, String)],
    log_sink: &std::fs::File,
) -> Result<u32, SupervisorError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .env_clear()
        .envs(env.iter().cloned())
        .stdin(Stdio::null())
        .stdout(Stdio::from(log_sink.try_clone().map_err(SupervisorError::Spawn)?))
        .stderr(Stdio::from(log_sink.try_clone().map_err(SupervisorError::Spawn)?))
        .process_group(0);
    let child = cmd.spawn().map_err(SupervisorError::Spawn)?;
    Ok(child.id())
}

/// Returns true if `pid` names a live, non-zombie process. Best-effort:
/// reads `/proc/<pid>/stat`; if `/proc` is unavailable, falls back to a
/// signal-0 existence probe (which cannot distinguish zombies).
pub fn is_process_alive(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => {
            // Format: "pid (comm) state ...". `comm` may contain spaces or
            // parens, so find the state char after the last ')'.
            match stat.rsplit_once(')') {
                Some((_, rest)) => {
                    let state = rest.trim_start().chars().next();
                    !matches!(state, Some('Z') | None)
                }
                None => false,
            }
        }
        Err(_) => signal::kill(Pid::from_raw(pid as i32), None).is_ok(),
    }
}

/// Children-first, then the parent: sends `SIGTERM` to every PID in
/// `process_group_descendants(pid)` plus `pid` itself, waits up to
/// `REAP_TIMEOUT` for the root to disappear, then force-`SIGKILL`s any
/// survivors. Idempotent: a missing root is treated as already reaped.
pub fn kill_tree(pid: u32) {
    if !is_process_alive(pid) {
        return;
    }
    let descendants = process_group_descendants(pid);
    for child_pid in &descendants {
        let _ = signal::kill(Pid::from_raw(*child_pid as i32), Signal::SIGTERM);
    }
    let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM);

    let deadline = Instant::now() + REAP_TIMEOUT;
    while Instant::now() < deadline {
        if !is_process_alive(pid) && descendants.iter().all(|p| !is_process_alive(*p)) {
            return;
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    for child_pid in &descendants {
        if is_process_alive(*child_pid) {
            let _ = signal::kill(Pid::from_raw(*child_pid as i32), Signal::SIGKILL);
        }
    }
    if is_process_alive(pid) {
        let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
    }
}

/// Scan `/proc` for PIDs whose process group id equals `pid` (the root is
/// its own group leader, since it was spawned via `process_group(0)`).
/// Returns an empty list (not an error) when `/proc` is unavailable.
fn process_group_descendants(pid: u32) -> Vec<u32> {
    let mut out = Vec::new();
    let Ok(entries) = std::fs::read_dir("/proc") else {
        return out;
    };
    for entry in entries.flatten() {
        let Some(candidate_pid) = entry.file_name().to_str().and_then(|s| s.parse::<u32>().ok())
        else {
            continue;
        };
        if candidate_pid == pid {
            continue;
        }
        if let Ok(stat) = std::fs::read_to_string(entry.path().join("stat")) {
            if let Some(pgid) = parse_pgid(&stat) {
                if pgid == pid {
                    out.push(candidate_pid);
                }
            }
        }
    }
    out
}

/// Field 5 (`pgrp`) of `/proc/<pid>/stat`, after the `)` that closes comm.
fn parse_pgid(stat: &str) -> Option<u32> {
    let (_, rest) = stat.rsplit_once(')')?;
    let mut fields = rest.split_whitespace();
    // rest = "state ppid pgrp ..." — state(1) ppid(2) pgrp(3) in this slice.
    fields.next()?; // state
    fields.next()?; // ppid
    fields.next()?.parse().ok()
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
