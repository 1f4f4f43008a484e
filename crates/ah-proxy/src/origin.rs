// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolving an `app_id` to the upstream origin the proxy forwards to.

use ah_core::{AppError, Clock};
use ah_lifecycle::LifecycleManager;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("no app with id {0}")]
    NotFound(String),

    #[error("upstream app is not reachable: {0}")]
    UpstreamUnavailable(String),
}

/// `scheme://127.0.0.1:port` for a live app. Always `http`: TLS termination
/// is out of scope (spec §1 non-goals), both for the outer listener and
/// for app-to-proxy traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamOrigin {
    pub host: String,
    pub port: u16,
}

impl UpstreamOrigin {
    pub fn http_base(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn ws_base(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }
}

/// Resolve `app_id`'s upstream origin via the Lifecycle Manager. An unknown
/// app surfaces as `NotFound`; a known app with no assigned port (never
/// started, or currently `failed`/`stopped`) surfaces as
/// `UpstreamUnavailable` rather than panicking on a missing port.
pub async fn resolve_origin<C: Clock + 'static>(
    lifecycle: &LifecycleManager<C>,
    app_id: &str,
) -> Result<UpstreamOrigin, ProxyError> {
    let record = lifecycle.get(app_id).await.map_err(|err| match err {
        AppError::NotFound(id) => ProxyError::NotFound(id),
        other => ProxyError::UpstreamUnavailable(other.to_string()),
    })?;
    let port = record
        .port
        .ok_or_else(|| ProxyError::UpstreamUnavailable(format!("app {app_id} has no assigned port")))?;
    Ok(UpstreamOrigin { host: "127.0.0.1".to_string(), port })
}
