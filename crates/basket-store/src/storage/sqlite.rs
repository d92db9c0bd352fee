//! SQLite storage backend over `basket_db`'s `kv_store` table.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use basket_db::{Database, DbConfig};

use super::KeyValueStorage;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct SqliteStorage {
    db: Database,
}

impl SqliteStorage {
    /// Opens (creating if needed) the database file and applies migrations.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Database(e.to_string()))?;
        }

        info!(path = %path.display(), "Opening SQLite cart storage");
        let db = Database::new(DbConfig::new(path)).await?;
        Ok(SqliteStorage { db })
    }

    /// Wraps an already-open database.
    pub fn from_database(db: Database) -> Self {
        SqliteStorage { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl KeyValueStorage for SqliteStorage {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.db
            .kv()
            .get(key)
            .await
            .map_err(|e| StoreError::storage(key, e))
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.db
            .kv()
            .set(key, value)
            .await
            .map_err(|e| StoreError::storage(key, e))
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.db
            .kv()
            .remove(key)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::storage(key, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_backend() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let storage = SqliteStorage::from_database(db);

        assert_eq!(storage.get("cart").await.unwrap(), None);
        storage.set("cart", "[]").await.unwrap();
        assert_eq!(storage.get("cart").await.unwrap().as_deref(), Some("[]"));
        storage.remove("cart").await.unwrap();
        storage.remove("cart").await.unwrap();
        assert_eq!(storage.get("cart").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("basket.db");

        let storage = SqliteStorage::open(&path).await.unwrap();
        storage.set("k", "v").await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_closed_database_reports_storage_error() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let storage = SqliteStorage::from_database(db);
        storage.database().close().await;

        let err = storage.set("cart", "[]").await.unwrap_err();
        assert!(matches!(err, StoreError::Storage { ref key, .. } if key == "cart"));
        assert!(err.is_retryable());
    }
}
