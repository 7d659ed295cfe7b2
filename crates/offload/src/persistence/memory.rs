//! In-memory implementation of StorageEngine for testing

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::engine::{StorageEngine, StoreError, StoredEntry};

/// In-memory implementation of StorageEngine
///
/// This is primarily for testing. It stores all entries in memory and
/// provides the same semantics as the SQLite implementation.
///
/// # Example
///
/// ```
/// use offload::persistence::InMemoryEngine;
///
/// let engine = InMemoryEngine::new();
/// ```
#[derive(Default)]
pub struct InMemoryEngine {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl InMemoryEngine {
    /// Create a new in-memory engine
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get the number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the engine holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Clear all entries (for testing)
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

#[async_trait]
impl StorageEngine for InMemoryEngine {
    async fn get(&self, key: &str) -> Result<Option<StoredEntry>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn put(&self, entry: StoredEntry) -> Result<(), StoreError> {
        self.entries.write().insert(entry.id.clone(), entry);
        Ok(())
    }
}
