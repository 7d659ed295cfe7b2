//! Persistence layer: the durable key-value store
//!
//! This module provides:
//! - [`StorageEngine`] trait for transactional key-indexed persistence
//! - [`SqliteEngine`] for durable, process-local storage
//! - [`InMemoryEngine`] for testing
//! - [`ResourceStore`] — the typed store applying the transform chain

mod engine;
mod memory;
mod sqlite;
mod store;

pub use engine::{EngineFailure, StorageEngine, StoreError, StoredEntry};
pub use memory::InMemoryEngine;
pub use sqlite::SqliteEngine;
pub use store::ResourceStore;
