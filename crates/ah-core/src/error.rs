// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The error kinds shared across every crate in this workspace.

use thiserror::Error;

/// Errors surfaced by the lifecycle manager, the stores, and the supervisor.
///
/// `ProvisioningFailure`/`StartupFailure` from the design notes are not
/// variants here: they are never returned as a `Result::Err`, only captured
/// onto `AppRecord::error` by the provisioner.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("no app with id {0}")]
    NotFound(String),

    #[error("app directory for id {0} already exists")]
    IdCollision(String),

    #[error("no free port in the configured range")]
    NoPortsAvailable,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("app request is not valid in its current state: {0}")]
    ConflictingState(String),

    #[error("upstream app is not reachable: {0}")]
    UpstreamUnavailable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;
