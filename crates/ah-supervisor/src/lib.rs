// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ah-supervisor: the Port Allocator and the Process Supervisor.

pub mod ports;
pub mod process;
pub mod reconcile;

pub use ports::{PortAllocator, PortError};
pub use process::{is_process_alive, kill_tree, spawn_in_new_group, SupervisorError, REAP_TIMEOUT};
pub use reconcile::refresh_status;
