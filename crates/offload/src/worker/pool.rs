//! Bounded worker pool with fail-fast dispatch

use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::spawn::{SpawnedUnit, WorkerHandle, WorkerSpawner};
use super::task::{Task, TaskError, TaskKind};

/// Fallback pool size when hardware parallelism cannot be detected
pub const DEFAULT_POOL_SIZE: usize = 4;

/// Detected hardware parallelism, or [`DEFAULT_POOL_SIZE`]
pub fn detected_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(DEFAULT_POOL_SIZE)
}

/// Worker pool configuration
///
/// # Example
///
/// ```
/// use offload::worker::{TaskKind, WorkerPoolConfig};
///
/// let config = WorkerPoolConfig::default()
///     .with_max_workers(2)
///     .with_task_kinds(vec![TaskKind::ComputeHash]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    /// Number of worker units to boot
    pub max_workers: usize,

    /// Declared task categories, for bookkeeping only (not used for routing)
    pub task_kinds: Vec<TaskKind>,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            max_workers: detected_parallelism(),
            task_kinds: TaskKind::ALL.to_vec(),
        }
    }
}

impl WorkerPoolConfig {
    /// Create a configuration with default sizing
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker units (minimum 1)
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Declare the task categories this pool serves
    pub fn with_task_kinds(mut self, task_kinds: Vec<TaskKind>) -> Self {
        self.task_kinds = task_kinds;
        self
    }
}

/// Worker pool errors
#[derive(Debug, thiserror::Error)]
pub enum WorkerPoolError {
    /// Every unit is busy (or the pool is terminated); callers apply their
    /// own queuing or backoff above this layer
    #[error("no available worker")]
    NoAvailableWorker,

    /// The dispatched task failed
    #[error("task execution failed: {0}")]
    TaskExecution(#[from] TaskError),
}

/// One worker unit and its busy flag
struct UnitSlot {
    id: usize,
    handle: WorkerHandle,
    join: JoinHandle<()>,
    busy: bool,
}

/// Bounded pool of isolated worker units
///
/// All units boot at construction. `run` assigns a task to the first idle
/// unit and fails fast with [`WorkerPoolError::NoAvailableWorker`] when every
/// unit is busy — excess requests are never queued. A task failure is
/// surfaced to its caller only; the unit is not retired and other in-flight
/// tasks are unaffected.
///
/// Calling [`terminate`](WorkerPool::terminate) with tasks still in flight
/// is undefined behavior at the task level (replies may be dropped); tear
/// the pool down only once outstanding work has settled.
///
/// # Example
///
/// ```
/// use offload::worker::{TaskKind, TokioSpawner, WorkerPool, WorkerPoolConfig};
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let pool = WorkerPool::new(&TokioSpawner::new(), WorkerPoolConfig::default());
///
/// let digest = pool.run(TaskKind::ComputeHash, json!("data")).await.unwrap();
/// assert_eq!(digest.as_str().unwrap().len(), 64);
///
/// pool.terminate();
/// # }
/// ```
pub struct WorkerPool {
    config: WorkerPoolConfig,
    units: Mutex<Vec<UnitSlot>>,
}

impl WorkerPool {
    /// Boot `config.max_workers` units via `spawner`
    pub fn new(spawner: &dyn WorkerSpawner, config: WorkerPoolConfig) -> Self {
        let units = (0..config.max_workers)
            .map(|id| {
                let SpawnedUnit { handle, join } = spawner.spawn();
                UnitSlot {
                    id,
                    handle,
                    join,
                    busy: false,
                }
            })
            .collect();

        info!(
            max_workers = config.max_workers,
            task_kinds = ?config.task_kinds,
            "worker pool started"
        );

        Self {
            config,
            units: Mutex::new(units),
        }
    }

    /// The pool's configuration
    pub fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    /// Number of units currently alive
    pub fn unit_count(&self) -> usize {
        self.units.lock().len()
    }

    /// Number of units currently executing a task
    pub fn busy_count(&self) -> usize {
        self.units.lock().iter().filter(|u| u.busy).count()
    }

    /// Whether a `run` call issued now would find an idle unit
    pub fn is_accepting(&self) -> bool {
        self.units.lock().iter().any(|u| !u.busy)
    }

    /// Execute a task on the first idle unit
    ///
    /// The unit is marked busy before dispatch and idle again on every exit
    /// path, success or failure. Release is tied to a drop guard, so a
    /// caller that abandons the returned future mid-await (timeout, select)
    /// still hands the unit back.
    #[instrument(skip(self, payload), fields(task = %kind))]
    pub async fn run(&self, kind: TaskKind, payload: Value) -> Result<Value, WorkerPoolError> {
        let (unit_id, handle) = self.acquire()?;
        let _release = ReleaseGuard {
            pool: self,
            unit_id,
        };
        debug!(unit_id, "task dispatched");

        match handle.run(Task::new(kind, payload)).await {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(unit_id, error = %err, "task failed");
                Err(WorkerPoolError::TaskExecution(err))
            }
        }
    }

    /// Stop and discard all units; idempotent
    pub fn terminate(&self) {
        let mut units = self.units.lock();
        if units.is_empty() {
            return;
        }

        info!(units = units.len(), "terminating worker pool");
        for unit in units.drain(..) {
            // Dropping the handle closes the unit's channel; abort covers a
            // unit parked mid-task.
            unit.join.abort();
        }
    }

    fn acquire(&self) -> Result<(usize, WorkerHandle), WorkerPoolError> {
        let mut units = self.units.lock();
        let slot = units
            .iter_mut()
            .find(|u| !u.busy)
            .ok_or(WorkerPoolError::NoAvailableWorker)?;
        slot.busy = true;
        Ok((slot.id, slot.handle.clone()))
    }

    fn release(&self, unit_id: usize) {
        let mut units = self.units.lock();
        // The slot may be gone if terminate ran while the task was in flight
        if let Some(slot) = units.iter_mut().find(|u| u.id == unit_id) {
            slot.busy = false;
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Marks a unit idle when dropped, whether `run` completes or is abandoned
struct ReleaseGuard<'a> {
    pool: &'a WorkerPool,
    unit_id: usize,
}

impl Drop for ReleaseGuard<'_> {
    fn drop(&mut self) {
        self.pool.release(self.unit_id);
    }
}
