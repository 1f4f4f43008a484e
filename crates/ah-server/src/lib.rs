// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `apphostd`: the control-plane binary. Wires the REST surface (spec §6,
//! §4.9) and the reverse proxy (§4.7, §4.8) onto one axum listener.

pub mod env;
pub mod handlers;
pub mod proxy;
pub mod state;

use ah_core::SystemClock;
use ah_lifecycle::LifecycleManager;
use ah_proxy::http::HttpProxy;
use axum::routing::{any, get, post};
use axum::Router;
use state::AppState;
use std::sync::Arc;

/// Build the full router: `/api/*` REST surface plus the `/apps/*` proxy
/// catch-all, on one listener (spec §9).
pub fn build_router(lifecycle: LifecycleManager<SystemClock>, public_base: Option<String>) -> Router {
    let state = AppState { lifecycle, http_proxy: Arc::new(HttpProxy::new()), public_base };

    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/apps", get(handlers::list_apps).post(handlers::create_app))
        .route(
            "/apps/{id}",
            get(handlers::get_app).patch(handlers::update_app).delete(handlers::delete_app),
        )
        .route("/apps/{id}/start", post(handlers::start_app))
        .route("/apps/{id}/stop", post(handlers::stop_app))
        .route("/apps/{id}/logs", get(handlers::tail_logs));

    Router::new()
        .nest("/api", api)
        .route("/apps/{id}", any(proxy::proxy_app_root))
        .route("/apps/{id}/{*rest}", any(proxy::proxy_app_subpath))
        .with_state(state)
}
