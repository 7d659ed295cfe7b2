//! StorageEngine trait definition

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::transform::TransformError;

/// A single record as persisted by a storage engine.
///
/// Entries are replaced whole on rewrite, never merged; every write is a
/// single atomic put.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    /// Unique key for this entry
    pub id: String,

    /// Opaque value bytes (already transformed, if transforms are configured)
    pub value: Vec<u8>,

    /// Write timestamp
    pub timestamp: DateTime<Utc>,
}

impl StoredEntry {
    /// Create an entry stamped with the current time
    pub fn new(id: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            value,
            timestamp: Utc::now(),
        }
    }
}

/// Structured failure detail carried by every engine-level store error
///
/// Raw engine errors never escape the persistence layer; callers
/// pattern-match on `code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineFailure {
    /// Stable, matchable failure code (e.g. `GET_ERROR`)
    pub code: String,

    /// Human-readable description
    pub message: String,

    /// Name of the underlying error class
    pub name: String,
}

impl EngineFailure {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for EngineFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.name, self.message)
    }
}

/// Error type for store operations
///
/// All failures are per-operation and non-fatal to the process; the store
/// performs no retries of its own.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Engine initialization failed (open rejected, quota, version conflict)
    #[error("store initialization failed: {0}")]
    Init(EngineFailure),

    /// Read transaction failed
    #[error("store read failed: {0}")]
    Get(EngineFailure),

    /// Write transaction failed
    #[error("store write failed: {0}")]
    Set(EngineFailure),

    /// A configured value transform rejected the data
    #[error("value transform failed: {0}")]
    Transform(#[from] TransformError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// The structured engine failure, if this error carries one
    pub fn failure(&self) -> Option<&EngineFailure> {
        match self {
            Self::Init(f) | Self::Get(f) | Self::Set(f) => Some(f),
            _ => None,
        }
    }
}

/// Transactional key-indexed storage engine
///
/// The store treats the engine as an external collaborator and depends only
/// on key lookup and atomic single-record puts. Implementations must be
/// thread-safe and support concurrent access.
#[async_trait]
pub trait StorageEngine: Send + Sync + 'static {
    /// Look up an entry by key
    ///
    /// An absent key is `Ok(None)`, never an error.
    async fn get(&self, key: &str) -> Result<Option<StoredEntry>, StoreError>;

    /// Persist an entry, replacing any prior value at the same key
    async fn put(&self, entry: StoredEntry) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_failure_display() {
        let failure = EngineFailure::new("GET_ERROR", "DatabaseError", "disk I/O error");
        assert_eq!(failure.to_string(), "GET_ERROR (DatabaseError): disk I/O error");
    }

    #[test]
    fn test_store_error_exposes_failure() {
        let err = StoreError::Set(EngineFailure::new("SET_ERROR", "DatabaseError", "locked"));
        let failure = err.failure().unwrap();
        assert_eq!(failure.code, "SET_ERROR");

        let err = StoreError::Serialization("bad json".to_string());
        assert!(err.failure().is_none());
    }

    #[test]
    fn test_stored_entry_is_stamped() {
        let before = Utc::now();
        let entry = StoredEntry::new("k", vec![1, 2, 3]);
        assert_eq!(entry.id, "k");
        assert!(entry.timestamp >= before);
    }
}
