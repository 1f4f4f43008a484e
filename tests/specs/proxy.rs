// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reverse proxy specs (spec §4.7, §6): `ANY /apps/{id}...` resolves the
//! app's origin and forwards, independent of the app's own lifecycle
//! bookkeeping — only whether *something* is listening on its assigned
//! port matters to the proxy.

use crate::prelude::*;
use reqwest::StatusCode;

#[tokio::test]
async fn proxying_to_an_unknown_app_is_404() {
    let server = start().await;
    let resp = server.client.get(server.url("/apps/app-doesnotexist00")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn proxying_to_a_known_app_with_no_live_upstream_is_bad_gateway() {
    let server = start().await;
    let created = create_app(&server, "demo", "streamlit\n", "# entry\n").await;
    let app_id = created["app_id"].as_str().expect("app_id").to_string();

    // Nothing is ever actually listening on the allocated port in this
    // fixture (there is no real Python to spawn it), so the proxy's own
    // connect attempt fails.
    let resp = server.client.get(server.url(&format!("/apps/{app_id}"))).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn proxying_forwards_to_a_reachable_app_regardless_of_recorded_status() {
    let server = start().await;
    let created = create_app(&server, "demo", "streamlit\n", "# entry\n").await;
    let app_id = created["app_id"].as_str().expect("app_id").to_string();
    let port = created["port"].as_u64().expect("port") as u16;

    // Stand in for the app process itself: whatever the lifecycle manager
    // currently thinks the app's status is, the proxy only cares that
    // something answers on the recorded port.
    let stub = axum::Router::new().fallback(|| async { "hello from app" });
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await.expect("bind stub upstream");
    tokio::spawn(async move {
        let _ = axum::serve(listener, stub).await;
    });

    let resp = server.client.get(server.url(&format!("/apps/{app_id}/"))).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert_eq!(body, "hello from app");
}
