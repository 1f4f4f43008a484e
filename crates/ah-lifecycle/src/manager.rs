// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The guarded state machine described in spec §4.6:
//!
//! ```text
//!              create
//!                 ▼
//!            starting ──provision OK──► running
//!                │                         │
//!                │  provision err          │ stop
//!                ▼                         ▼
//!             failed ◄──── start ──── stopped
//!                │                         │
//!                └──── start ──────────────┘
//! ```
//!
//! `delete` is allowed from any state (best-effort stop first); `update` is
//! allowed from any state (stop → replace files → start).

use crate::locks::LockTable;
use ah_core::{sha256_hex, AppError, AppId, AppRecord, AppResult, AppStatus, Clock};
use ah_provisioner::Provisioner;
use ah_storage::{LogWriter, MetaStore};
use ah_supervisor::{kill_tree, refresh_status, PortAllocator};
use std::sync::Arc;

/// Public façade over the whole app lifecycle. Cheap to clone: every field
/// is itself a handle (`Arc` or a cheaply-cloneable store).
#[derive(Clone)]
pub struct LifecycleManager<C: Clock> {
    meta: MetaStore,
    logs: LogWriter,
    ports: Arc<PortAllocator>,
    provisioner: Arc<Provisioner<C>>,
    locks: Arc<LockTable>,
    clock: C,
}

impl<C: Clock + 'static> LifecycleManager<C> {
    pub fn new(
        meta: MetaStore,
        logs: LogWriter,
        ports: Arc<PortAllocator>,
        provisioner: Arc<Provisioner<C>>,
        clock: C,
    ) -> Self {
        Self { meta, logs, ports, provisioner, locks: Arc::new(LockTable::new()), clock }
    }

    pub fn logs(&self) -> &LogWriter {
        &self.logs
    }

    /// Mint a new app, persist it with `status=starting`, and dispatch
    /// provisioning as a detached background task. Returns as soon as the
    /// record is persisted — does not wait for provisioning to finish.
    pub async fn create(
        &self,
        name: String,
        manifest_bytes: &[u8],
        entry_bytes: &[u8],
    ) -> AppResult<AppRecord> {
        let app_id = AppId::new();
        let guard = self.locks.get(app_id.as_str());
        let _guard = guard.lock().await;

        self.meta.create_app_dir(app_id.as_str()).map_err(|_| {
            AppError::IdCollision(app_id.as_str().to_string())
        })?;
        std::fs::write(self.meta.manifest_path(app_id.as_str()), manifest_bytes)?;
        std::fs::write(self.meta.entry_path(app_id.as_str()), entry_bytes)?;

        let requirements_digest = sha256_hex(manifest_bytes);
        let entry_digest = sha256_hex(entry_bytes);
        let now = self.clock.utc_now();
        let mut record = AppRecord::new(app_id, name, requirements_digest, entry_digest, now);

        let port = self.ports.allocate().map_err(|_| AppError::NoPortsAvailable)?;
        record.port = Some(port);
        self.meta.save(&record)?;
        let _ = self.logs.append_line(record.app_id.as_str(), "created, dispatching provisioner");

        self.dispatch_provisioner(record.app_id.as_str());
        Ok(record)
    }

    /// Load, reconcile against OS process state, and return. `NotFound` if
    /// the app directory doesn't exist.
    pub async fn get(&self, app_id: &str) -> AppResult<AppRecord> {
        let guard = self.locks.get(app_id);
        let _guard = guard.lock().await;
        self.load_and_reconcile(app_id)
    }

    /// Load every app, reconcile each, sorted by `created_at` descending.
    pub async fn list(&self) -> AppResult<Vec<AppRecord>> {
        let mut records = self.meta.list()?;
        for record in &mut records {
            if refresh_status(record, &self.clock) {
                let _ = self.meta.save(record);
            }
        }
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    /// Best-effort stop, overwrite whichever files were given, clear
    /// `error`/`pid`, re-resolve the port, and dispatch provisioning again.
    pub async fn update(
        &self,
        app_id: &str,
        name: Option<String>,
        manifest_bytes: Option<&[u8]>,
        entry_bytes: Option<&[u8]>,
    ) -> AppResult<AppRecord> {
        let guard = self.locks.get(app_id);
        let _guard = guard.lock().await;

        let mut record = self.load_and_reconcile(app_id)?;
        if let Some(pid) = record.pid {
            kill_tree(pid);
        }

        if let Some(bytes) = manifest_bytes {
            std::fs::write(self.meta.manifest_path(app_id), bytes)?;
            record.requirements_digest = sha256_hex(bytes);
        }
        if let Some(bytes) = entry_bytes {
            std::fs::write(self.meta.entry_path(app_id), bytes)?;
            record.entry_digest = sha256_hex(bytes);
        }

        let port = self.resolve_port(record.port)?;
        let now = self.clock.utc_now();
        record.mutate(now, |r| {
            if let Some(name) = name.filter(|n| !n.is_empty()) {
                r.name = name;
            }
            r.error = None;
            r.pid = None;
            r.port = Some(port);
            r.status = AppStatus::Starting;
        });
        self.meta.save(&record)?;
        let _ = self.logs.append_line(app_id, "update: re-dispatching provisioner");
        self.dispatch_provisioner(app_id);
        Ok(record)
    }

    /// Reconcile, kill the live process tree if any, clear `pid`, mark
    /// `stopped`, persist. Idempotent.
    pub async fn stop(&self, app_id: &str) -> AppResult<AppRecord> {
        let guard = self.locks.get(app_id);
        let _guard = guard.lock().await;

        let mut record = self.load_and_reconcile(app_id)?;
        if let Some(pid) = record.pid {
            kill_tree(pid);
        }
        let now = self.clock.utc_now();
        record.mutate(now, |r| {
            r.pid = None;
            r.status = AppStatus::Stopped;
        });
        self.meta.save(&record)?;
        let _ = self.logs.append_line(app_id, "stopped");
        Ok(record)
    }

    /// No-op if already running with a live pid; otherwise clear
    /// `pid`/`error`, re-resolve the port, and dispatch provisioning.
    pub async fn start(&self, app_id: &str) -> AppResult<AppRecord> {
        let guard = self.locks.get(app_id);
        let _guard = guard.lock().await;

        let mut record = self.load_and_reconcile(app_id)?;
        if record.status == AppStatus::Running && record.pid.is_some() {
            return Ok(record);
        }

        let port = self.resolve_port(record.port)?;
        let now = self.clock.utc_now();
        record.mutate(now, |r| {
            r.pid = None;
            r.error = None;
            r.port = Some(port);
            r.status = AppStatus::Starting;
        });
        self.meta.save(&record)?;
        let _ = self.logs.append_line(app_id, "start: dispatching provisioner");
        self.dispatch_provisioner(app_id);
        Ok(record)
    }

    /// Best-effort stop (ignoring `NotFound`), then remove the app's whole
    /// directory subtree. Idempotent: `get` afterward returns `NotFound`.
    pub async fn delete(&self, app_id: &str) -> AppResult<()> {
        let guard = self.locks.get(app_id);
        let _guard = guard.lock().await;

        match self.load_and_reconcile(app_id) {
            Ok(record) => {
                if let Some(pid) = record.pid {
                    kill_tree(pid);
                }
            }
            Err(AppError::NotFound(_)) => {}
            Err(err) => return Err(err),
        }
        self.meta.remove_app_dir(app_id)?;
        drop(_guard);
        self.locks.evict(app_id);
        Ok(())
    }

    pub async fn tail_logs(&self, app_id: &str, n: usize) -> AppResult<String> {
        // Existence check: tailing an unknown app is a 404, not an empty log.
        let guard = self.locks.get(app_id);
        let _guard = guard.lock().await;
        self.meta.load(app_id).map_err(|_| AppError::NotFound(app_id.to_string()))?;
        Ok(self.logs.tail(app_id, n)?)
    }

    fn load_and_reconcile(&self, app_id: &str) -> AppResult<AppRecord> {
        let mut record =
            self.meta.load(app_id).map_err(|_| AppError::NotFound(app_id.to_string()))?;
        if refresh_status(&mut record, &self.clock) {
            self.meta.save(&record)?;
        }
        Ok(record)
    }

    /// Reuse `current` if it is still free on the bind host, else allocate
    /// a fresh one.
    fn resolve_port(&self, current: Option<u16>) -> AppResult<u16> {
        if let Some(port) = current {
            if self.ports.is_free(port) {
                return Ok(port);
            }
        }
        self.ports.allocate().map_err(|_| AppError::NoPortsAvailable)
    }

    fn dispatch_provisioner(&self, app_id: &str) {
        let provisioner = self.provisioner.clone();
        let app_id = app_id.to_string();
        tokio::spawn(async move {
            provisioner.run(&app_id).await;
        });
    }

    /// Re-dispatch provisioning for every app left in `starting` after a
    /// restart. A `starting` record with no `pid` never actually finished
    /// spawning before the previous process exited — unlike a `running`
    /// record, reconciliation has no OS process to demote it with, so it
    /// would otherwise sit in `starting` forever. Called once at `apphostd`
    /// boot, folding in the original's multi-app bootstrap sweep.
    pub async fn resume_starting(&self) -> AppResult<usize> {
        let records = self.list().await?;
        let mut resumed = 0;
        for record in records {
            if record.status == AppStatus::Starting && record.pid.is_none() {
                let _ = self.logs.append_line(record.app_id.as_str(), "resuming provisioning after restart");
                self.dispatch_provisioner(record.app_id.as_str());
                resumed += 1;
            }
        }
        Ok(resumed)
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
