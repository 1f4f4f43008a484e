// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! REST surface specs (spec §4.9, §6): create/get/list/update/start/stop/
//! delete/logs against a real in-process `apphostd` router.

use crate::prelude::*;
use reqwest::StatusCode;

#[tokio::test]
async fn create_persists_starting_status_with_an_assigned_port() {
    let server = start().await;
    let created = create_app(&server, "demo", "streamlit\n", "# entry\n").await;

    assert_eq!(created["status"], "starting");
    assert!(created["port"].as_u64().is_some());
    assert!(created["app_id"].as_str().is_some());
}

#[tokio::test]
async fn get_reflects_the_eventual_failed_status_once_provisioning_finishes() {
    let server = start().await;
    let created = create_app(&server, "demo", "streamlit\n", "# entry\n").await;
    let app_id = created["app_id"].as_str().expect("app_id").to_string();

    // /bin/true stands in for Python: it "succeeds" at `-m venv` without
    // creating a real one, so the pipeline's next real command (the venv's
    // own python/pip) fails to spawn and the app lands on `failed`.
    let reached = wait_for(WAIT_MAX_MS, || {
        let server = &server;
        let app_id = app_id.clone();
        async move {
            let body: serde_json::Value =
                server.client.get(server.url(&format!("/api/apps/{app_id}"))).send().await.unwrap().json().await.unwrap();
            body["status"] == "failed"
        }
    })
    .await;
    assert!(reached, "app should reach failed status once provisioning runs");

    let body: serde_json::Value =
        server.client.get(server.url(&format!("/api/apps/{app_id}"))).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["status"], "failed");
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn list_includes_every_created_app() {
    let server = start().await;
    create_app(&server, "one", "streamlit\n", "# entry\n").await;
    create_app(&server, "two", "streamlit\n", "# entry\n").await;

    let body: serde_json::Value = server.client.get(server.url("/api/apps")).send().await.unwrap().json().await.unwrap();
    let list = body.as_array().expect("array");
    assert_eq!(list.len(), 2);
}

#[tokio::test]
async fn get_unknown_app_is_404() {
    let server = start().await;
    let resp = server.client.get(server.url("/api/apps/app-doesnotexist00")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stop_is_idempotent_and_then_start_redispatches() {
    let server = start().await;
    let created = create_app(&server, "demo", "streamlit\n", "# entry\n").await;
    let app_id = created["app_id"].as_str().expect("app_id").to_string();

    let stop_once: serde_json::Value =
        server.client.post(server.url(&format!("/api/apps/{app_id}/stop"))).send().await.unwrap().json().await.unwrap();
    assert_eq!(stop_once["status"], "stopped");

    let stop_twice: serde_json::Value =
        server.client.post(server.url(&format!("/api/apps/{app_id}/stop"))).send().await.unwrap().json().await.unwrap();
    assert_eq!(stop_twice["status"], "stopped");

    let started: serde_json::Value =
        server.client.post(server.url(&format!("/api/apps/{app_id}/start"))).send().await.unwrap().json().await.unwrap();
    assert_eq!(started["status"], "starting");
    assert!(started["port"].as_u64().is_some());
}

#[tokio::test]
async fn update_replaces_digests_and_redispatches_provisioning() {
    let server = start().await;
    let created = create_app(&server, "demo", "streamlit\n", "# entry v1\n").await;
    let app_id = created["app_id"].as_str().expect("app_id").to_string();

    let before: serde_json::Value =
        server.client.get(server.url(&format!("/api/apps/{app_id}"))).send().await.unwrap().json().await.unwrap();
    let digest_before = before["entry_digest"].as_str().expect("digest").to_string();

    let form = reqwest::multipart::Form::new().part(
        "app",
        reqwest::multipart::Part::bytes(b"# entry v2\n".to_vec()).file_name("app.py"),
    );
    let updated: serde_json::Value = server
        .client
        .patch(server.url(&format!("/api/apps/{app_id}")))
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_ne!(updated["entry_digest"].as_str().unwrap(), digest_before);
    assert_eq!(updated["status"], "starting");
}

#[tokio::test]
async fn delete_removes_the_app_and_subsequent_get_is_404() {
    let server = start().await;
    let created = create_app(&server, "demo", "streamlit\n", "# entry\n").await;
    let app_id = created["app_id"].as_str().expect("app_id").to_string();

    let resp =
        server.client.delete(server.url(&format!("/api/apps/{app_id}"))).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = server.client.get(server.url(&format!("/api/apps/{app_id}"))).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_is_idempotent_enough_to_be_repeated_without_panicking() {
    let server = start().await;
    let created = create_app(&server, "demo", "streamlit\n", "# entry\n").await;
    let app_id = created["app_id"].as_str().expect("app_id").to_string();

    server.client.delete(server.url(&format!("/api/apps/{app_id}"))).send().await.unwrap();
    let resp = server.client.delete(server.url(&format!("/api/apps/{app_id}"))).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tail_logs_captures_the_provisioning_narrative() {
    let server = start().await;
    let created = create_app(&server, "demo", "streamlit\n", "# entry\n").await;
    let app_id = created["app_id"].as_str().expect("app_id").to_string();

    let reached = wait_for(WAIT_MAX_MS, || {
        let server = &server;
        let app_id = app_id.clone();
        async move {
            let body: serde_json::Value = server
                .client
                .get(server.url(&format!("/api/apps/{app_id}/logs")))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            body["logs"].as_str().unwrap_or_default().contains("FAILED")
        }
    })
    .await;
    assert!(reached, "log should eventually record the provisioning failure");
}
