//! Bounded worker pool for offloading CPU-bound tasks
//!
//! This module provides:
//! - [`WorkerPool`] - Fixed-size pool with fail-fast dispatch
//! - [`WorkerApi`] - The fixed task API (`process_data`, `compute_hash`,
//!   `compress`, `encrypt`) installed in every unit
//! - [`WorkerSpawner`] / [`TokioSpawner`] - Capability for booting units
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       WorkerPool                          │
//! │   run(kind, payload)                                      │
//! │      │  acquire: first idle unit, else NoAvailableWorker  │
//! │      ▼                                                    │
//! │   ┌────────┐   ┌────────┐   ┌────────┐   ┌────────┐      │
//! │   │ unit 0 │   │ unit 1 │   │ unit 2 │   │ unit N │      │
//! │   │ (task) │   │ (task) │   │ (task) │   │ (task) │      │
//! │   └────────┘   └────────┘   └────────┘   └────────┘      │
//! │      ▲ mpsc envelope in / oneshot reply out               │
//! │      │  release: unit idle on every exit path             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Units are isolated: they share no memory with the caller or each other,
//! and a failing task never retires its unit or disturbs the others. There
//! is no retry at this layer — that belongs to the resource loader.

mod pool;
mod spawn;
mod task;

pub use pool::{
    detected_parallelism, WorkerPool, WorkerPoolConfig, WorkerPoolError, DEFAULT_POOL_SIZE,
};
pub use spawn::{SpawnedUnit, TokioSpawner, WorkerHandle, WorkerSpawner};
pub use task::{sha256_hex, Task, TaskError, TaskHandler, TaskKind, TaskResult, WorkerApi};
