// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// A provisioning-phase failure. Never surfaced as a caller-visible error —
/// the pipeline catches it, writes its `Display` into `AppRecord::error`,
/// and sets `status = failed`.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("no free port in the configured range")]
    NoPortsAvailable,

    #[error("failed to create isolated runtime: {0}")]
    CreateRuntime(String),

    #[error("pip upgrade timed out after {0:?}")]
    PipUpgradeTimeout(std::time::Duration),

    #[error("pip upgrade failed: {0}")]
    PipUpgradeFailed(String),

    #[error("installing the serving framework timed out after {0:?}")]
    EnsureFrameworkTimeout(std::time::Duration),

    #[error("installing the serving framework failed: {0}")]
    EnsureFrameworkFailed(String),

    #[error("installing the manifest timed out after {0:?}")]
    InstallManifestTimeout(std::time::Duration),

    #[error("installing the manifest failed: {0}")]
    InstallManifestFailed(String),

    #[error("failed to spawn the app: {0}")]
    Spawn(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
