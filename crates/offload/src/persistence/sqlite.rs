//! SQLite implementation of StorageEngine

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::debug;

use super::engine::{EngineFailure, StorageEngine, StoreError, StoredEntry};

/// SQLite-backed implementation of StorageEngine
///
/// Durable, process-local persistence. The handle is cheap to clone (the
/// underlying pool is Arc-backed), so concurrent users share a single
/// initialization rather than re-opening the database.
///
/// # Example
///
/// ```ignore
/// use offload::persistence::SqliteEngine;
///
/// let engine = SqliteEngine::open("cache.db").await?;
/// ```
#[derive(Clone)]
pub struct SqliteEngine {
    pool: SqlitePool,
}

impl SqliteEngine {
    /// Open (creating if absent) the database at `path`
    ///
    /// Idempotent: the entries table is created only when missing, so
    /// repeated opens of the same path are safe.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let url = format!("sqlite://{}?mode=rwc", path.as_ref().display());
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| init_error(&e))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| init_error(&e))?;

        Self::from_pool(pool).await
    }

    /// Open a transient in-memory database (for tests)
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| init_error(&e))?;

        // A :memory: database exists per-connection; cap the pool at one so
        // every query sees the same database.
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| init_error(&e))?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS cache_entries (
                id        TEXT PRIMARY KEY,
                value     BLOB NOT NULL,
                timestamp TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| init_error(&e))?;

        debug!("sqlite engine ready");
        Ok(Self { pool })
    }

    /// Close the underlying connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl StorageEngine for SqliteEngine {
    async fn get(&self, key: &str) -> Result<Option<StoredEntry>, StoreError> {
        let row: Option<(Vec<u8>, String)> =
            sqlx::query_as("SELECT value, timestamp FROM cache_entries WHERE id = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Get(engine_failure("GET_ERROR", &e)))?;

        let Some((value, timestamp)) = row else {
            return Ok(None);
        };

        let timestamp = DateTime::parse_from_rfc3339(&timestamp)
            .map_err(|e| {
                StoreError::Get(EngineFailure::new(
                    "GET_ERROR",
                    "CorruptTimestamp",
                    e.to_string(),
                ))
            })?
            .with_timezone(&Utc);

        Ok(Some(StoredEntry {
            id: key.to_string(),
            value,
            timestamp,
        }))
    }

    async fn put(&self, entry: StoredEntry) -> Result<(), StoreError> {
        // Single-statement upsert: the replace is atomic, no entry is ever
        // partially written.
        sqlx::query(
            "INSERT INTO cache_entries (id, value, timestamp)
             VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 value = excluded.value,
                 timestamp = excluded.timestamp",
        )
        .bind(&entry.id)
        .bind(&entry.value)
        .bind(entry.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Set(engine_failure("SET_ERROR", &e)))?;

        Ok(())
    }
}

fn init_error(err: &sqlx::Error) -> StoreError {
    StoreError::Init(engine_failure("DB_INIT_ERROR", err))
}

fn engine_failure(code: &str, err: &sqlx::Error) -> EngineFailure {
    let name = match err {
        sqlx::Error::Database(_) => "DatabaseError",
        sqlx::Error::Io(_) => "IoError",
        sqlx::Error::PoolTimedOut => "PoolTimedOut",
        sqlx::Error::PoolClosed => "PoolClosed",
        _ => "SqlxError",
    };
    EngineFailure::new(code, name, err.to_string())
}
