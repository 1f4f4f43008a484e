// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ah-proxy: the transparent HTTP and WebSocket reverse proxy (spec §4.7,
//! §4.8). For a requested app id, resolves its upstream origin via the
//! Lifecycle Manager and forwards the request.

pub mod http;
pub mod origin;
pub mod ws;

pub use origin::{resolve_origin, ProxyError, UpstreamOrigin};
