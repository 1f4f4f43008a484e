// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persisted app record and its status machine.

use crate::id::AppId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an app currently sits in its lifecycle.
///
/// Transitions are owned by the lifecycle manager and the provisioner;
/// see `ah-lifecycle` for the guarded state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppStatus {
    Created,
    Starting,
    Running,
    Failed,
    Stopped,
}

impl AppStatus {
    pub fn is_live(self) -> bool {
        matches!(self, AppStatus::Starting | AppStatus::Running)
    }
}

impl std::fmt::Display for AppStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AppStatus::Created => "created",
            AppStatus::Starting => "starting",
            AppStatus::Running => "running",
            AppStatus::Failed => "failed",
            AppStatus::Stopped => "stopped",
        };
        write!(f, "{s}")
    }
}

/// The durable record for one hosted app. One file per app; see `ah-storage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppRecord {
    pub app_id: AppId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: AppStatus,
    pub port: Option<u16>,
    pub pid: Option<u32>,
    pub error: Option<String>,
    pub requirements_digest: String,
    pub entry_digest: String,
}

impl AppRecord {
    /// Start a brand-new record: `status = starting`, no port/pid/error yet.
    /// Port is assigned by the caller before persisting the first time.
    pub fn new(
        app_id: AppId,
        name: String,
        requirements_digest: String,
        entry_digest: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            app_id,
            name,
            created_at: now,
            updated_at: now,
            status: AppStatus::Starting,
            port: None,
            pid: None,
            error: None,
            requirements_digest,
            entry_digest,
        }
    }

    /// Stamp `updated_at` and apply `f`. Enforces the monotonic-non-decreasing
    /// invariant: if `now` is not strictly after the current `updated_at`,
    /// the record is still advanced by one millisecond so `updated_at_after
    /// > updated_at_before` always holds.
    pub fn mutate(&mut self, now: DateTime<Utc>, f: impl FnOnce(&mut Self)) {
        f(self);
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + chrono::Duration::milliseconds(1)
        };
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
