//! Typed store over a storage engine, with a symmetric transform chain

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::engine::{StorageEngine, StoreError, StoredEntry};
use crate::transform::ValueTransform;

/// Durable key-value store with pluggable value transforms
///
/// Values are serialized to JSON bytes, run through each configured
/// transform's `encode` in order, and persisted with a write timestamp.
/// Reads run the transforms' `decode` in reverse order before
/// deserializing, so any transform chain round-trips: compress-then-encrypt
/// on write implies decrypt-then-decompress on read.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use offload::persistence::{InMemoryEngine, ResourceStore};
/// use offload::transform::Zstd;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = ResourceStore::new(Arc::new(InMemoryEngine::new()))
///     .with_transform(Zstd::default());
///
/// store.set("greeting", &"hello".to_string()).await.unwrap();
/// let value: Option<String> = store.get("greeting").await.unwrap();
/// assert_eq!(value.as_deref(), Some("hello"));
/// # }
/// ```
#[derive(Clone)]
pub struct ResourceStore {
    engine: Arc<dyn StorageEngine>,
    transforms: Vec<Arc<dyn ValueTransform>>,
}

impl ResourceStore {
    /// Create a store over the given engine with no transforms
    pub fn new(engine: Arc<dyn StorageEngine>) -> Self {
        Self {
            engine,
            transforms: Vec::new(),
        }
    }

    /// Append a transform to the write-path chain
    ///
    /// Write order is configuration order; read order is its mirror.
    pub fn with_transform(mut self, transform: impl ValueTransform + 'static) -> Self {
        self.transforms.push(Arc::new(transform));
        self
    }

    /// Look up a value; `None` (not an error) when the key is absent
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(entry) = self.engine.get(key).await? else {
            return Ok(None);
        };

        let mut bytes = entry.value;
        for transform in self.transforms.iter().rev() {
            bytes = transform.decode(bytes)?;
        }

        let value = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Some(value))
    }

    /// Persist a value under `key`, replacing any prior value
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let mut bytes =
            serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        for transform in &self.transforms {
            bytes = transform.encode(bytes)?;
        }

        debug!(key, bytes = bytes.len(), "persisting entry");
        self.engine.put(StoredEntry::new(key, bytes)).await
    }

    /// The raw entry (transformed bytes and write timestamp) for `key`
    pub async fn entry(&self, key: &str) -> Result<Option<StoredEntry>, StoreError> {
        self.engine.get(key).await
    }
}
