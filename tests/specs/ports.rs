// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port allocation specs (spec §4.5): every app gets a distinct port out
//! of the configured range, and exhaustion surfaces as a real error
//! instead of silently reusing a port that's in use.

use crate::prelude::*;
use reqwest::StatusCode;

#[tokio::test]
async fn two_apps_created_back_to_back_get_distinct_ports() {
    let server = start().await;
    let a = create_app(&server, "a", "streamlit\n", "# entry\n").await;
    let b = create_app(&server, "b", "streamlit\n", "# entry\n").await;

    let port_a = a["port"].as_u64().expect("port a");
    let port_b = b["port"].as_u64().expect("port b");
    assert_ne!(port_a, port_b, "distinct apps should not collide on a port");
}

#[tokio::test]
async fn create_fails_with_a_server_error_once_the_port_range_is_exhausted() {
    // Occupy the only port in range for the life of this test, so the
    // allocator's bind-and-close probe genuinely finds nothing free.
    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind occupant");
    let port = occupied.local_addr().expect("local addr").port();

    let server = start_with_ports(port, port).await;
    let resp = create_app_response(&server, "demo", "streamlit\n", "# entry\n").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    drop(occupied);
}
