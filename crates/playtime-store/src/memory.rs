//! In-memory store with failure injection, for tests

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::{KeyValueStore, StoreError, StoreResult, StoredValue};

/// In-memory key-path store.
///
/// Keeps "durable" and "pending" maps apart so tests can observe exactly
/// what a crash would leave behind.
#[derive(Default)]
pub struct MemoryKvStore {
    durable: Mutex<BTreeMap<String, StoredValue>>,
    pending: Mutex<BTreeMap<String, StoredValue>>,
    flushes: AtomicU64,
    fail_flush: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent flush fail until cleared
    pub fn set_fail_flush(&self, fail: bool) {
        self.fail_flush.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail until cleared
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful flushes so far
    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::SeqCst)
    }

    /// Copy of what would survive a crash right now
    pub fn durable_snapshot(&self) -> BTreeMap<String, StoredValue> {
        self.durable.lock().map(|d| d.clone()).unwrap_or_default()
    }

    /// Drop every unflushed write, as a crash would
    pub fn simulate_crash(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.clear();
        }
    }

    fn lock<'a>(
        map: &'a Mutex<BTreeMap<String, StoredValue>>,
    ) -> StoreResult<MutexGuard<'a, BTreeMap<String, StoredValue>>> {
        map.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> StoreResult<Option<StoredValue>> {
        if let Some(value) = Self::lock(&self.pending)?.get(key) {
            return Ok(Some(value.clone()));
        }
        Ok(Self::lock(&self.durable)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: StoredValue) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database("injected write failure".into()));
        }
        Self::lock(&self.pending)?.insert(key.to_string(), value);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut keys = BTreeSet::new();
        for map in [&self.pending, &self.durable] {
            keys.extend(
                Self::lock(map)?
                    .keys()
                    .filter(|k| k.starts_with(prefix))
                    .cloned(),
            );
        }
        Ok(keys.into_iter().collect())
    }

    fn flush(&self) -> StoreResult<()> {
        if self.fail_flush.load(Ordering::SeqCst) {
            return Err(StoreError::Database("injected flush failure".into()));
        }
        let writes = std::mem::take(&mut *Self::lock(&self.pending)?);
        Self::lock(&self.durable)?.extend(writes);
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        !self.fail_flush.load(Ordering::SeqCst)
    }
}
