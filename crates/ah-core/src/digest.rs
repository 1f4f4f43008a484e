// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SHA-256 content digests for uploaded manifest/entry files.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `bytes`, used for `AppRecord::requirements_digest`
/// and `AppRecord::entry_digest`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
