// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The startup pipeline. Runs on a background task, never on the request
//! thread: resolve port → starting → create runtime → upgrade pip →
//! ensure framework → install manifest → spawn → running. Any failure in
//! the first seven steps is captured onto the record as `status=failed`;
//! there are no retries.

use crate::error::ProvisionError;
use crate::runtime::{self, FRAMEWORK_TOKEN};
use ah_core::{AppRecord, AppStatus, Clock};
use ah_storage::{LogWriter, MetaStore};
use ah_supervisor::{spawn_in_new_group, PortAllocator};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

pub const PIP_UPGRADE_TIMEOUT: Duration = Duration::from_secs(15 * 60);
pub const ENSURE_FRAMEWORK_TIMEOUT: Duration = Duration::from_secs(20 * 60);
pub const INSTALL_MANIFEST_TIMEOUT: Duration = Duration::from_secs(30 * 60);

pub struct Provisioner<C: Clock> {
    meta: MetaStore,
    logs: LogWriter,
    ports: Arc<PortAllocator>,
    bind_host: String,
    python_bin: String,
    clock: C,
}

impl<C: Clock> Provisioner<C> {
    pub fn new(
        meta: MetaStore,
        logs: LogWriter,
        ports: Arc<PortAllocator>,
        bind_host: String,
        python_bin: String,
        clock: C,
    ) -> Self {
        Self { meta, logs, ports, bind_host, python_bin, clock }
    }

    /// Run every phase for `app_id`, loading and persisting the record as it
    /// progresses. The record is expected to already exist (created by the
    /// lifecycle manager) with `status = starting`.
    pub async fn run(&self, app_id: &str) {
        let mut record = match self.meta.load(app_id) {
            Ok(r) => r,
            Err(err) => {
                tracing::error!(app_id, error = %err, "provisioner could not load record");
                return;
            }
        };

        match self.run_phases(&mut record).await {
            Ok(()) => {
                let now = self.clock.utc_now();
                record.mutate(now, |r| r.status = AppStatus::Running);
                let _ = self.logs.append_line(
                    app_id,
                    &format!(
                        "started pid={} port={}",
                        record.pid.unwrap_or_default(),
                        record.port.unwrap_or_default()
                    ),
                );
            }
            Err(err) => {
                let now = self.clock.utc_now();
                let msg = err.to_string();
                record.mutate(now, |r| {
                    r.status = AppStatus::Failed;
                    r.error = Some(msg.clone());
                });
                let _ = self.logs.append_line(app_id, &format!("FAILED: {msg}"));
                tracing::warn!(app_id, error = %msg, "provisioning failed");
            }
        }

        if let Err(err) = self.meta.save(&record) {
            tracing::error!(app_id, error = %err, "failed to persist record after provisioning");
        }
    }

    async fn run_phases(&self, record: &mut AppRecord) -> Result<(), ProvisionError> {
        let app_id = record.app_id.as_str().to_string();

        // Phase 1: resolve port.
        let port = match record.port {
            Some(p) if self.ports.is_free(p) => p,
            _ => self.ports.allocate().map_err(|_| ProvisionError::NoPortsAvailable)?,
        };
        record.port = Some(port);

        // Phase 2: starting.
        let now = self.clock.utc_now();
        record.mutate(now, |r| r.status = AppStatus::Starting);
        self.meta.save(record)?;
        let _ = self.logs.append_line(&app_id, &format!("provisioning: resolved port={port}"));

        let app_dir = self.meta.app_dir(&app_id);
        let venv_dir = self.meta.venv_dir(&app_id);

        // Phase 3: create isolated runtime.
        if !venv_dir.exists() {
            let _ = self.logs.append_line(&app_id, "provisioning: creating isolated runtime");
            run_command(
                &self.python_bin,
                &["-m".to_string(), "venv".to_string(), venv_dir.display().to_string()],
                &app_dir,
            )
            .await
            .map_err(ProvisionError::CreateRuntime)?;
        }

        let python = runtime::python_path(&venv_dir);
        let pip = runtime::pip_path(&venv_dir);

        // Phase 4: upgrade the package installer.
        let _ = self.logs.append_line(&app_id, "provisioning: upgrading pip");
        self.run_with_timeout(
            &app_id,
            &python.display().to_string(),
            &["-m".to_string(), "pip".to_string(), "install".to_string(), "--upgrade".to_string(), "pip".to_string()],
            &app_dir,
            PIP_UPGRADE_TIMEOUT,
        )
        .await
        .map_err(|e| e.into_phase(
            ProvisionError::PipUpgradeTimeout(PIP_UPGRADE_TIMEOUT),
            ProvisionError::PipUpgradeFailed,
        ))?;

        // Phase 5: ensure the serving framework is present.
        let manifest_path = self.meta.manifest_path(&app_id);
        let manifest = std::fs::read_to_string(&manifest_path).unwrap_or_default();
        if !runtime::manifest_mentions(&manifest, FRAMEWORK_TOKEN) {
            let _ = self
                .logs
                .append_line(&app_id, &format!("provisioning: installing {FRAMEWORK_TOKEN} explicitly"));
            self.run_with_timeout(
                &app_id,
                &pip.display().to_string(),
                &["install".to_string(), FRAMEWORK_TOKEN.to_string()],
                &app_dir,
                ENSURE_FRAMEWORK_TIMEOUT,
            )
            .await
            .map_err(|e| e.into_phase(
                ProvisionError::EnsureFrameworkTimeout(ENSURE_FRAMEWORK_TIMEOUT),
                ProvisionError::EnsureFrameworkFailed,
            ))?;
        }

        // Phase 6: install the manifest, if non-empty.
        if !manifest.trim().is_empty() {
            let _ = self.logs.append_line(&app_id, "provisioning: installing manifest");
            self.run_with_timeout(
                &app_id,
                &pip.display().to_string(),
                &["install".to_string(), "-r".to_string(), manifest_path.display().to_string()],
                &app_dir,
                INSTALL_MANIFEST_TIMEOUT,
            )
            .await
            .map_err(|e| e.into_phase(
                ProvisionError::InstallManifestTimeout(INSTALL_MANIFEST_TIMEOUT),
                ProvisionError::InstallManifestFailed,
            ))?;
        }

        // Phase 7: spawn the app.
        let entry_path = self.meta.entry_path(&app_id);
        let args = runtime::spawn_args(&entry_path, &self.bind_host, port, &app_id);
        let mut env: Vec<(String, String)> = std::env::vars().collect();
        env.push(("PYTHONUNBUFFERED".to_string(), "1".to_string()));
        let log_sink = self.logs.child_sink(&app_id)?;
        let pid = spawn_in_new_group(&python.display().to_string(), &args, &app_dir, &env, &log_sink)
            .map_err(|e| ProvisionError::Spawn(e.to_string()))?;

        // Phase 8: capture PID (status/persist handled by the caller).
        record.pid = Some(pid);
        Ok(())
    }

    async fn run_with_timeout(
        &self,
        app_id: &str,
        program: &str,
        args: &[String],
        cwd: &Path,
        timeout: Duration,
    ) -> Result<(), TimeoutOrFailure> {
        match tokio::time::timeout(timeout, run_command(program, args, cwd)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(msg)) => {
                let _ = self.logs.append_line(app_id, &format!("command failed: {program} {args:?}: {msg}"));
                Err(TimeoutOrFailure::Failed(msg))
            }
            Err(_) => {
                let _ = self.logs.append_line(app_id, &format!("command timed out: {program} {args:?}"));
                Err(TimeoutOrFailure::TimedOut)
            }
        }
    }
}

enum TimeoutOrFailure {
    TimedOut,
    Failed(String),
}

impl TimeoutOrFailure {
    fn into_phase(
        self,
        timeout_err: ProvisionError,
        failed_err: impl FnOnce(String) -> ProvisionError,
    ) -> ProvisionError {
        match self {
            TimeoutOrFailure::TimedOut => timeout_err,
            TimeoutOrFailure::Failed(msg) => failed_err(msg),
        }
    }
}

/// Run `program args` in `cwd` to completion, returning combined
/// stdout+stderr on a non-zero exit.
async fn run_command(program: &str, args: &[String], cwd: &Path) -> Result<(), String> {
    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| e.to_string())?;
    if output.status.success() {
        Ok(())
    } else {
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Err(combined)
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
