//! # Key-Value Repository
//!
//! One row per key in `kv_store`. `set` is an upsert, so writing the cart
//! blob repeatedly under the same key never grows the table.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Repository for key-value operations.
#[derive(Debug, Clone)]
pub struct KvRepository {
    pool: SqlitePool,
}

impl KvRepository {
    pub fn new(pool: SqlitePool) -> Self {
        KvRepository { pool }
    }

    /// Reads the value stored under `key`, if any.
    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        debug!(key = %key, found = value.is_some(), "kv get");
        Ok(value)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        debug!(key = %key, bytes = value.len(), "kv set");
        Ok(())
    }

    /// Deletes `key`. Returns true if a row was removed.
    pub async fn remove(&self, key: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_get_missing_key() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert_eq!(db.kv().get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get_overwrites() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let kv = db.kv();

        kv.set("@Products:products", "[]").await.unwrap();
        kv.set("@Products:products", r#"[{"id":"p1"}]"#).await.unwrap();

        assert_eq!(
            kv.get("@Products:products").await.unwrap().as_deref(),
            Some(r#"[{"id":"p1"}]"#)
        );
    }

    #[tokio::test]
    async fn test_remove() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let kv = db.kv();

        kv.set("k", "v").await.unwrap();
        assert!(kv.remove("k").await.unwrap());
        assert!(!kv.remove("k").await.unwrap());
        assert_eq!(kv.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_value_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("basket.db");

        {
            let db = Database::new(DbConfig::new(&path)).await.unwrap();
            db.kv().set("cart", "[1]").await.unwrap();
            db.close().await;
        }

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert_eq!(db.kv().get("cart").await.unwrap().as_deref(), Some("[1]"));
    }
}
