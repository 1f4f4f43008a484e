// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port Allocator: hands out a free TCP port in a fixed range.
//!
//! Holds an allocator-wide mutex across the whole probe→return sequence so
//! two concurrent allocations can never settle on the same port. It does
//! not remember handed-out ports — the bind-and-close probe here plus the
//! supervisor's immediate bind on spawn *is* the reservation.

use parking_lot::Mutex;
use std::net::{SocketAddr, TcpListener};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("no free port in [{0}, {1}]")]
    NoPortsAvailable(u16, u16),
}

pub struct PortAllocator {
    bind_host: String,
    port_min: u16,
    port_max: u16,
    guard: Mutex<()>,
}

impl PortAllocator {
    pub fn new(bind_host: impl Into<String>, port_min: u16, port_max: u16) -> Self {
        Self { bind_host: bind_host.into(), port_min, port_max, guard: Mutex::new(()) }
    }

    /// Probe the host for a free port, holding the allocator mutex across
    /// the whole scan.
    pub fn allocate(&self) -> Result<u16, PortError> {
        let _guard = self.guard.lock();
        for port in self.port_min..=self.port_max {
            if self.is_free_locked(port) {
                return Ok(port);
            }
        }
        Err(PortError::NoPortsAvailable(self.port_min, self.port_max))
    }

    /// Check whether `port` is still free, without holding the allocator
    /// mutex across callers — used to decide whether a record's already
    /// assigned port can be reused as-is.
    pub fn is_free(&self, port: u16) -> bool {
        let _guard = self.guard.lock();
        self.is_free_locked(port)
    }

    fn is_free_locked(&self, port: u16) -> bool {
        let addr: SocketAddr = match format!("{}:{}", self.bind_host, port).parse() {
            Ok(addr) => addr,
            Err(_) => return false,
        };
        TcpListener::bind(addr).is_ok()
    }
}

#[cfg(test)]
#[path = "ports_tests.rs"]
mod tests;
