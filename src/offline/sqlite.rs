//! `SQLite` key-value store — one table, records addressed by
//! `(namespace, key)`.
//!
//! A save always takes the next sequence number in its namespace, so `all`
//! returns records in last-saved order, matching remove-then-save semantics.

use serde_json::Value;
use sqlx::SqlitePool;

use super::types::{KeyValueStore, StoreError};

#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
    namespace: String,
}

impl SqliteKeyValueStore {
    #[must_use]
    pub fn new(pool: SqlitePool, namespace: impl Into<String>) -> Self {
        Self { pool, namespace: namespace.into() }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

#[async_trait::async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn save(&self, key: &str, record: &Value) -> Result<(), StoreError> {
        let value = serde_json::to_string(record)?;
        sqlx::query(
            "INSERT INTO records (namespace, key, value, seq) \
             VALUES (?1, ?2, ?3, (SELECT COALESCE(MAX(seq), 0) + 1 FROM records WHERE namespace = ?1)) \
             ON CONFLICT (namespace, key) DO UPDATE SET value = excluded.value, seq = excluded.seq",
        )
        .bind(&self.namespace)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query_scalar::<_, String>("SELECT value FROM records WHERE namespace = ?1 AND key = ?2")
            .bind(&self.namespace)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|text| serde_json::from_str(&text).map_err(StoreError::from)).transpose()
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM records WHERE namespace = ?1 AND key = ?2")
            .bind(&self.namespace)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Value>, StoreError> {
        let rows = sqlx::query_scalar::<_, String>("SELECT value FROM records WHERE namespace = ?1 ORDER BY seq")
            .bind(&self.namespace)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|text| serde_json::from_str(text).map_err(StoreError::from)).collect()
    }
}

#[cfg(test)]
#[path = "sqlite_test.rs"]
mod tests;
