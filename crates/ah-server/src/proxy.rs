// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires the shared HTTP/WebSocket reverse proxy (`ah-proxy`) onto
//! `ANY /apps/{id}` and `ANY /apps/{id}/{*rest}` (spec §6 proxy surface).

use crate::state::AppState;
use ah_proxy::origin::ProxyError;
use ah_proxy::ws::WsProxy;
use axum::body::Body;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

pub async fn proxy_app_root(
    state: State<AppState>,
    Path(app_id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    ws: Option<WebSocketUpgrade>,
    body: Body,
) -> Response {
    serve(state.0, app_id, method, uri, headers, ws, body).await
}

pub async fn proxy_app_subpath(
    state: State<AppState>,
    Path((app_id, _rest)): Path<(String, String)>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    ws: Option<WebSocketUpgrade>,
    body: Body,
) -> Response {
    serve(state.0, app_id, method, uri, headers, ws, body).await
}

async fn serve(
    state: AppState,
    app_id: String,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    ws: Option<WebSocketUpgrade>,
    body: Body,
) -> Response {
    let origin = match ah_proxy::resolve_origin(&state.lifecycle, &app_id).await {
        Ok(origin) => origin,
        Err(ProxyError::NotFound(id)) => {
            return (StatusCode::NOT_FOUND, format!("no app with id {id}")).into_response()
        }
        Err(ProxyError::UpstreamUnavailable(msg)) => {
            return (StatusCode::BAD_GATEWAY, msg).into_response()
        }
    };

    if let Some(ws) = ws {
        return WsProxy::proxy(ws, &origin, &uri, &headers).await;
    }

    let external_host =
        headers.get(axum::http::header::HOST).and_then(|v| v.to_str().ok()).unwrap_or("localhost");
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    state.http_proxy.forward(&origin, method, path_and_query, &headers, body, external_host, "http").await
}
