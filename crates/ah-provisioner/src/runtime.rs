// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Paths into the per-app isolated runtime directory, and manifest sniffing.

use std::path::{Path, PathBuf};

pub const FRAMEWORK_TOKEN: &str = "streamlit";

pub fn python_path(venv_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        venv_dir.join("Scripts").join("python.exe")
    } else {
        venv_dir.join("bin").join("python")
    }
}

pub fn pip_path(venv_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        venv_dir.join("Scripts").join("pip.exe")
    } else {
        venv_dir.join("bin").join("pip")
    }
}

/// True if any non-blank, non-comment line in the manifest contains
/// `token` as a case-insensitive substring.
pub fn manifest_mentions(manifest: &str, token: &str) -> bool {
    let token = token.to_ascii_lowercase();
    manifest.lines().map(str::trim).filter(|l| !l.is_empty() && !l.starts_with('#')).any(|line| {
        line.to_ascii_lowercase().contains(&token)
    })
}

/// Build the argv for the spawn phase (spec §4.5.7). The `--server.*`
/// flags are the serving framework's own CLI flags, so the framework has
/// to be the process receiving them: `-m streamlit run <entry> --server...`,
/// never the entry script invoked directly.
pub fn spawn_args(entry_path: &Path, bind_host: &str, port: u16, app_id: &str) -> Vec<String> {
    vec![
        "-m".to_string(),
        FRAMEWORK_TOKEN.to_string(),
        "run".to_string(),
        entry_path.display().to_string(),
        "--server.address".to_string(),
        bind_host.to_string(),
        "--server.port".to_string(),
        port.to_string(),
        "--server.baseUrlPath".to_string(),
        format!("apps/{app_id}"),
        "--server.headless".to_string(),
        "true".to_string(),
        "--server.enableCORS".to_string(),
        "false".to_string(),
        "--server.enableXsrfProtection".to_string(),
        "false".to_string(),
    ]
}
