// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared state handed to every axum handler.

use ah_core::SystemClock;
use ah_lifecycle::LifecycleManager;
use ah_proxy::http::HttpProxy;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: LifecycleManager<SystemClock>,
    pub http_proxy: Arc<HttpProxy>,
    pub public_base: Option<String>,
}

impl AppState {
    /// `{public_base}/apps/{app_id}/`, or `None` when no public base is
    /// configured (spec §6: `*_PUBLIC_BASE`).
    pub fn access_url(&self, app_id: &str) -> Option<String> {
        self.public_base.as_ref().map(|base| format!("{}/apps/{}/", base.trim_end_matches('/'), app_id))
    }
}
