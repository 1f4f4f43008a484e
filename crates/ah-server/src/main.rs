// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `apphostd`: the self-hosted app-host control plane. Configuration is
//! entirely environment-driven (spec §6); see `ah_server::env`.

use ah_core::SystemClock;
use ah_lifecycle::LifecycleManager;
use ah_provisioner::Provisioner;
use ah_server::env;
use ah_storage::{LogWriter, MetaStore};
use ah_supervisor::{kill_tree, PortAllocator};
use clap::Parser;
use std::sync::Arc;

/// No subcommands: every setting is environment-driven (spec §6). This
/// exists so `apphostd --help`/`--version` behave like any other binary.
#[derive(Parser)]
#[command(name = "apphostd", version)]
struct Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let data_dir = env::data_dir();
    std::fs::create_dir_all(data_dir.join("apps"))?;
    std::fs::create_dir_all(data_dir.join("tmp"))?;

    let meta = MetaStore::new(&data_dir);
    let logs = LogWriter::new(&data_dir);
    let ports = Arc::new(PortAllocator::new(env::bind_host(), env::port_min(), env::port_max()));
    let provisioner = Arc::new(Provisioner::new(
        meta.clone(),
        logs.clone(),
        ports.clone(),
        env::bind_host(),
        env::python_bin(),
        SystemClock,
    ));
    let lifecycle = LifecycleManager::new(meta, logs, ports, provisioner, SystemClock);

    match lifecycle.resume_starting().await {
        Ok(0) => {}
        Ok(n) => tracing::info!(count = n, "resumed provisioning for apps left starting across restart"),
        Err(err) => tracing::warn!(error = %err, "failed to sweep for apps needing resumed provisioning"),
    }

    let router = ah_server::build_router(lifecycle.clone(), env::public_base());

    let bind_addr = format!("{}:{}", env::bind_host(), env::api_port());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "apphostd listening");

    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal(lifecycle)).await?;

    Ok(())
}

/// Wait for Ctrl-C, then best-effort `kill_tree` every app still recorded
/// as live. Transient `running` records on next boot are corrected by
/// reconciliation on first read (spec §5).
async fn shutdown_signal(lifecycle: LifecycleManager<SystemClock>) {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("apphostd shutting down, terminating live app processes");
    if let Ok(records) = lifecycle.list().await {
        for record in records {
            if let Some(pid) = record.pid {
                kill_tree(pid);
            }
        }
    }
}
