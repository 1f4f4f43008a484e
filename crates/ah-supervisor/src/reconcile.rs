// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Liveness reconciliation: compares a persisted record's `status`/`pid`
//! against the OS process table and corrects the record in place.

use crate::process::is_process_alive;
use ah_core::{AppRecord, AppStatus, Clock};

/// Apply `refresh_status` to `record`, returning true if it was changed
/// and therefore needs to be persisted by the caller.
///
/// - `pid` absent: no change.
/// - `pid` present and alive: promote to `running` if not already
///   `{running, starting}`.
/// - `pid` present but gone: clear it; demote `{running, starting}` to
///   `stopped`.
pub fn refresh_status(record: &mut AppRecord, clock: &impl Clock) -> bool {
    let Some(pid) = record.pid else {
        return false;
    };

    if is_process_alive(pid) {
        if !matches!(record.status, AppStatus::Running | AppStatus::Starting) {
            let now = clock.utc_now();
            record.mutate(now, |r| r.status = AppStatus::Running);
            tracing::info!(app_id = %record.app_id, pid, "reconciled: process alive, promoted to running");
            return true;
        }
        return false;
    }

    let was_live = matches!(record.status, AppStatus::Running | AppStatus::Starting);
    let now = clock.utc_now();
    record.mutate(now, |r| {
        r.pid = None;
        if was_live {
            r.status = AppStatus::Stopped;
        }
    });
    if was_live {
        tracing::warn!(app_id = %record.app_id, pid, "reconciled: process gone, demoted to stopped");
    }
    true
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
