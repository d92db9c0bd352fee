//! # Key-Value Storage
//!
//! The store persists one JSON blob under one key. Anything that can `get`
//! and `set` a string by key can back it.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────────────┐
//! │ CartActor    │────►│                          │────► MemoryStorage
//! │ (hydrate)    │     │  Arc<dyn KeyValueStorage>│
//! │ PersistWriter│────►│                          │────► SqliteStorage
//! │ (set)        │     └──────────────────────────┘      (basket-db)
//! └──────────────┘
//! ```

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{StorageBackend, StoreConfig};
use crate::error::StoreResult;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

/// Asynchronous string key-value storage.
///
/// Failures are reported as [`crate::StoreError::Storage`] naming the key.
#[async_trait]
pub trait KeyValueStorage: Send + Sync + 'static {
    /// Returns the value under `key`, or `None` if the key was never set.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Deletes `key`. Missing keys are not an error.
    async fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Shared handle to a storage backend.
pub type SharedStorage = Arc<dyn KeyValueStorage>;

/// Opens the backend selected by `config.storage.backend`.
pub async fn open(config: &StoreConfig) -> StoreResult<SharedStorage> {
    match config.storage.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStorage::new())),
        StorageBackend::Sqlite => {
            let path = config.database_path()?;
            Ok(Arc::new(SqliteStorage::open(path).await?))
        }
    }
}
