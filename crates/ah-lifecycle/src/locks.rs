// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-`app_id` logical lock table: no two mutating operations on the same
//! app overlap; distinct apps proceed in parallel. Entries are evicted on
//! delete (best-effort — a benign race just means the next access mints a
//! fresh, uncontended lock).

use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

#[derive(Default)]
pub struct LockTable {
    locks: SyncMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, app_id: &str) -> Arc<AsyncMutex<()>> {
        self.locks.lock().entry(app_id.to_string()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }

    pub fn evict(&self, app_id: &str) {
        self.locks.lock().remove(app_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_app_id_shares_one_mutex() {
        let table = LockTable::new();
        let a = table.get("app-x");
        let b = table.get("app-x");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn distinct_app_ids_get_distinct_mutexes() {
        let table = LockTable::new();
        let a = table.get("app-x");
        let b = table.get("app-y");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn evict_allows_a_fresh_mutex_to_be_minted() {
        let table = LockTable::new();
        let a = table.get("app-x");
        table.evict("app-x");
        let b = table.get("app-x");
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
