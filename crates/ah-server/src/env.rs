// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for `apphostd` (spec §6).

use std::path::PathBuf;

/// Root data directory: `apps/<app_id>/` and `tmp/` live under here.
pub fn data_dir() -> PathBuf {
    std::env::var("APPHOST_DATA").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("./data"))
}

/// Lower bound of the port range handed out to apps, inclusive.
pub fn port_min() -> u16 {
    parsed_or("APPHOST_PORT_MIN", 8501)
}

/// Upper bound of the port range handed out to apps, inclusive.
pub fn port_max() -> u16 {
    parsed_or("APPHOST_PORT_MAX", 8999)
}

/// Host the control plane binds to and passes through to children.
pub fn bind_host() -> String {
    std::env::var("APPHOST_BIND").unwrap_or_else(|_| "0.0.0.0".to_string())
}

/// Listener port for the REST + proxy HTTP surface.
pub fn api_port() -> u16 {
    parsed_or("APPHOST_API_PORT", 8080)
}

/// Absolute URL base used to compute `access_url` in API responses. Absent
/// when unset, in which case responses omit `access_url` entirely.
pub fn public_base() -> Option<String> {
    std::env::var("APPHOST_PUBLIC_BASE").ok().filter(|s| !s.is_empty())
}

/// Python interpreter used to create each app's isolated runtime.
pub fn python_bin() -> String {
    std::env::var("APPHOST_PYTHON_BIN").unwrap_or_else(|_| "python3".to_string())
}

fn parsed_or<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}
