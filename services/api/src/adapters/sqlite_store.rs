//! services/api/src/adapters/sqlite_store.rs
//!
//! This module contains the SQLite adapter, a concrete implementation of the
//! `SnapshotRepository` port. Snapshots live in a small key/value table so several
//! storage keys can share one database file.

use async_trait::async_trait;
use campus_core::domain::Snapshot;
use campus_core::ports::{Clock, PortError, PortResult, SnapshotRepository};
use chrono::SecondsFormat;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A SQLite adapter that implements the `SnapshotRepository` port.
#[derive(Clone)]
pub struct SqliteSnapshotStore {
    pool: SqlitePool,
    key: String,
    clock: Arc<dyn Clock>,
}

impl SqliteSnapshotStore {
    /// Creates a new `SqliteSnapshotStore` over an existing pool. `clock` stamps
    /// the `updated_at` column.
    pub fn new(pool: SqlitePool, key: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            key: key.into(),
            clock,
        }
    }

    /// Opens (creating if needed) the database at `url` and prepares the schema.
    pub async fn connect(
        url: &str,
        key: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // A single long-lived connection keeps `sqlite::memory:` databases alive
        // and serialises writes.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self::new(pool, key, clock);
        store.run_migrations().await?;
        Ok(store)
    }

    /// A helper function to create the storage table at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kv_storage (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

//=========================================================================================
// `SnapshotRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl SnapshotRepository for SqliteSnapshotStore {
    async fn load(&self) -> PortResult<Option<Snapshot>> {
        let row = sqlx::query("SELECT value FROM kv_storage WHERE key = ?")
            .bind(&self.key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PortError::Storage(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let value: String = row
            .try_get("value")
            .map_err(|e| PortError::Storage(e.to_string()))?;
        serde_json::from_str(&value)
            .map(Some)
            .map_err(|e| PortError::Corrupt(format!("kv_storage[{}]: {e}", self.key)))
    }

    async fn save(&self, snapshot: &Snapshot) -> PortResult<()> {
        let value = serde_json::to_string(snapshot)
            .map_err(|e| PortError::Unexpected(format!("failed to encode snapshot: {e}")))?;

        sqlx::query(
            "INSERT INTO kv_storage (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(&self.key)
        .bind(value)
        .bind(self.clock.now().to_rfc3339_opts(SecondsFormat::Millis, true))
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Storage(e.to_string()))?;
        Ok(())
    }
}
