//! In-process storage backend.
//!
//! Keeps every value in a map and records each successful `set` in a write
//! log, so tests can assert what was persisted and in which order. Reads and
//! writes can be made to fail on demand.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::KeyValueStorage;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    write_log: Mutex<Vec<(String, String)>>,
    failing_writes: AtomicUsize,
    failing_reads: AtomicBool,
    write_delay: Mutex<Option<Duration>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage with `key` already holding `value`.
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.into(), value.into());
        MemoryStorage {
            entries: Mutex::new(entries),
            ..Self::default()
        }
    }

    /// Makes the next `n` calls to `set` fail.
    pub fn fail_next_writes(&self, n: usize) {
        self.failing_writes.store(n, Ordering::SeqCst);
    }

    /// Makes every `get` fail until turned off.
    pub fn fail_reads(&self, fail: bool) {
        self.failing_reads.store(fail, Ordering::SeqCst);
    }

    /// Delays every `set` by `delay` before it takes effect.
    pub async fn set_write_delay(&self, delay: Option<Duration>) {
        *self.write_delay.lock().await = delay;
    }

    /// Current value under `key`, bypassing fault injection.
    pub async fn value(&self, key: &str) -> Option<String> {
        self.entries.lock().await.get(key).cloned()
    }

    /// Every successful write, oldest first.
    pub async fn writes(&self) -> Vec<(String, String)> {
        self.write_log.lock().await.clone()
    }

    pub async fn write_count(&self) -> usize {
        self.write_log.lock().await.len()
    }

    fn take_write_failure(&self) -> bool {
        self.failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(StoreError::storage(key, "injected read failure"));
        }
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let delay = *self.write_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.take_write_failure() {
            return Err(StoreError::storage(key, "injected write failure"));
        }

        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        self.write_log
            .lock()
            .await
            .push((key.to_string(), value.to_string()));
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
