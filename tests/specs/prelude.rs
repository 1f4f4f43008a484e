// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture for the end-to-end specs: each test boots a real
//! `apphostd` router (`ah_server::build_router`) on an ephemeral
//! `127.0.0.1` port, backed by a fresh temp data directory.
//!
//! There is no real Python interpreter in this sandbox, so every fixture
//! uses `/bin/true` as the configured `python_bin` — every provisioning
//! pipeline run here is exercised up through whichever phase `/bin/true`
//! can fake (it "succeeds" at anything) and then fails for real once the
//! pipeline tries to run a venv's `python`/`pip` that was never actually
//! created. That failure path is itself part of spec §4.6/§5 and is what
//! these specs exercise; `ah-provisioner`'s own tests use the same stand-in
//! for the same reason.

use ah_core::SystemClock;
use ah_lifecycle::LifecycleManager;
use ah_provisioner::Provisioner;
use ah_storage::{LogWriter, MetaStore};
use ah_supervisor::PortAllocator;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const WAIT_MAX_MS: u64 = 5_000;

pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    _dir: TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Boot a server with the default test port range.
pub async fn start() -> TestServer {
    start_with_ports(19700, 19720).await
}

/// Boot a server with a caller-chosen port range, e.g. to force exhaustion.
pub async fn start_with_ports(port_min: u16, port_max: u16) -> TestServer {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(dir.path().join("apps")).expect("create apps dir");
    std::fs::create_dir_all(dir.path().join("tmp")).expect("create tmp dir");

    let meta = MetaStore::new(dir.path());
    let logs = LogWriter::new(dir.path());
    let ports = Arc::new(PortAllocator::new("127.0.0.1", port_min, port_max));
    let provisioner = Arc::new(Provisioner::new(
        meta.clone(),
        logs.clone(),
        ports.clone(),
        "127.0.0.1".to_string(),
        "/bin/true".to_string(),
        SystemClock,
    ));
    let lifecycle = LifecycleManager::new(meta, logs, ports, provisioner, SystemClock);
    let router = ah_server::build_router(lifecycle, None);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    TestServer { addr, client: reqwest::Client::new(), _dir: dir }
}

/// Upload a new app, returning the parsed `CreateResponse` JSON body.
pub async fn create_app(server: &TestServer, name: &str, requirements: &str, entry: &str) -> serde_json::Value {
    create_app_response(server, name, requirements, entry)
        .await
        .json()
        .await
        .expect("create response is JSON")
}

/// Same as `create_app`, but hands back the raw `reqwest::Response` so
/// callers can assert on status codes (e.g. exhaustion returning 500).
pub async fn create_app_response(
    server: &TestServer,
    name: &str,
    requirements: &str,
    entry: &str,
) -> reqwest::Response {
    let form = reqwest::multipart::Form::new()
        .text("name", name.to_string())
        .part(
            "requirements",
            reqwest::multipart::Part::bytes(requirements.as_bytes().to_vec()).file_name("requirements.txt"),
        )
        .part("app", reqwest::multipart::Part::bytes(entry.as_bytes().to_vec()).file_name("app.py"));
    server
        .client
        .post(server.url("/api/apps"))
        .multipart(form)
        .send()
        .await
        .expect("create request sent")
}

/// Poll `pred` every 20ms up to `max_ms`, returning `true` as soon as it
/// reports success, `false` on timeout.
pub async fn wait_for<F, Fut>(max_ms: u64, mut pred: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = std::time::Instant::now();
    loop {
        if pred().await {
            return true;
        }
        if start.elapsed() >= Duration::from_millis(max_ms) {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
