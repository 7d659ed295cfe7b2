//! # Offload
//!
//! A client-side resource cache and worker-dispatch core: persistent
//! memoization of fetched/derived values, and a bounded pool of isolated
//! workers for CPU-bound tasks — both built to keep cost off the caller's
//! main line of execution.
//!
//! ## Features
//!
//! - **Durable key-value store**: atomic, timestamped puts over a pluggable
//!   engine (SQLite for durability, in-memory for tests)
//! - **Symmetric value transforms**: compression and encryption strategies
//!   applied in mirror order on write/read, identity by default
//! - **Resource loading**: caller-supplied async producers with exponential
//!   backoff retries and staleness/GC metadata on every cached record
//! - **Worker pool**: fixed task API on isolated units, fail-fast when
//!   saturated, task failures isolated to their caller
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ResourceLoader                          │
//! │  (producer + retry/backoff, writes CacheRecord per success) │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ResourceStore                           │
//! │  (transform chain over a StorageEngine: sqlite / memory)    │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       WorkerPool                             │
//! │  (bounded units, message-passing dispatch, fail-fast)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The loader and the pool are independent: one manages cached entries, the
//! other manages execution units, and neither calls the other.
//!
//! ## Example
//!
//! ```ignore
//! use offload::prelude::*;
//!
//! let engine = SqliteEngine::open("cache.db").await?;
//! let store = ResourceStore::new(Arc::new(engine)).with_transform(Zstd::default());
//!
//! let loader = ResourceLoader::new(store, ResourceOptions::default());
//! let report: Report = loader.load(|| fetch_report()).await?;
//!
//! let pool = WorkerPool::new(&TokioSpawner::new(), WorkerPoolConfig::default());
//! let digest = pool.run(TaskKind::ComputeHash, json!(report.body)).await?;
//! ```

pub mod loader;
pub mod persistence;
pub mod reliability;
pub mod transform;
pub mod worker;

/// Prelude for common imports
pub mod prelude {
    pub use crate::loader::{
        CacheRecord, Freshness, LoadStatus, ResourceLoadError, ResourceLoader, ResourceOptions,
    };
    pub use crate::persistence::{
        EngineFailure, InMemoryEngine, ResourceStore, SqliteEngine, StorageEngine, StoreError,
        StoredEntry,
    };
    pub use crate::reliability::RetryPolicy;
    pub use crate::transform::{AesGcm, Identity, TransformError, ValueTransform, Zstd};
    pub use crate::worker::{
        TaskKind, TokioSpawner, WorkerApi, WorkerPool, WorkerPoolConfig, WorkerPoolError,
        WorkerSpawner,
    };
}

// Re-export key types at crate root
pub use loader::{CacheRecord, Freshness, LoadStatus, ResourceLoadError, ResourceLoader, ResourceOptions};
pub use persistence::{
    EngineFailure, InMemoryEngine, ResourceStore, SqliteEngine, StorageEngine, StoreError,
    StoredEntry,
};
pub use reliability::RetryPolicy;
pub use transform::{AesGcm, Identity, TransformError, ValueTransform, Zstd};
pub use worker::{TaskKind, TokioSpawner, WorkerApi, WorkerPool, WorkerPoolConfig, WorkerPoolError};
