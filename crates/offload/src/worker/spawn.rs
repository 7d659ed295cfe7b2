//! Spawning isolated worker units
//!
//! Units communicate by message passing only: a task request travels over an
//! mpsc channel, the reply comes back over a oneshot. The spawning mechanism
//! is a capability behind [`WorkerSpawner`] so alternative transports
//! (threads, processes) can slot in without touching pool logic.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use super::task::{Task, TaskError, TaskResult, WorkerApi};

/// A task in flight to a worker unit, with its reply channel
struct TaskEnvelope {
    task: Task,
    reply: oneshot::Sender<TaskResult>,
}

/// Remote handle to a spawned worker unit
///
/// Exposes the unit's task API as if local: send a task, await its result or
/// error. Cloning the handle does not grant extra parallelism — the unit
/// still executes one task at a time.
#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<TaskEnvelope>,
}

impl WorkerHandle {
    /// Invoke the unit's task method and await the result
    pub async fn run(&self, task: Task) -> TaskResult {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(TaskEnvelope {
                task,
                reply: reply_tx,
            })
            .await
            .map_err(|_| TaskError::new("worker unit is gone"))?;

        reply_rx
            .await
            .map_err(|_| TaskError::new("worker unit dropped the task"))?
    }
}

/// A freshly spawned unit: its remote handle plus the join handle used to
/// tear it down
pub struct SpawnedUnit {
    pub handle: WorkerHandle,
    pub join: JoinHandle<()>,
}

/// Capability for booting isolated worker units
pub trait WorkerSpawner: Send + Sync {
    /// Boot one unit exposing the fixed task API
    fn spawn(&self) -> SpawnedUnit;
}

/// Spawner backed by tokio tasks
///
/// Each unit is an independent task owning its receiver; it serves envelopes
/// one at a time until its channel closes.
#[derive(Clone, Default)]
pub struct TokioSpawner {
    api: WorkerApi,
}

impl TokioSpawner {
    /// Spawner installing the default handler table in every unit
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawner installing a custom handler table in every unit
    pub fn with_api(api: WorkerApi) -> Self {
        Self { api }
    }
}

impl WorkerSpawner for TokioSpawner {
    fn spawn(&self) -> SpawnedUnit {
        let (tx, mut rx) = mpsc::channel::<TaskEnvelope>(1);
        let api = self.api.clone();

        let join = tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let result = api.execute(envelope.task).await;
                // A dropped reply receiver means the caller gave up; the
                // unit keeps serving.
                let _ = envelope.reply.send(result);
            }
            debug!("worker unit channel closed, exiting");
        });

        SpawnedUnit {
            handle: WorkerHandle { tx },
            join,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::task::TaskKind;
    use serde_json::json;

    #[tokio::test]
    async fn test_spawned_unit_serves_tasks() {
        let spawner = TokioSpawner::new();
        let unit = spawner.spawn();

        let result = unit
            .handle
            .run(Task::new(TaskKind::ComputeHash, json!("hello")))
            .await
            .unwrap();

        assert_eq!(
            result,
            json!("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
        );
        unit.join.abort();
    }

    #[tokio::test]
    async fn test_unit_survives_task_failure() {
        let spawner = TokioSpawner::new();
        let unit = spawner.spawn();

        let err = unit
            .handle
            .run(Task::new(TaskKind::ComputeHash, json!(42)))
            .await
            .unwrap_err();
        assert!(err.message.contains("string payload"));

        // The same unit keeps serving after a failed task
        let result = unit
            .handle
            .run(Task::new(TaskKind::ProcessData, json!("next")))
            .await
            .unwrap();
        assert_eq!(result, json!("next"));
        unit.join.abort();
    }

    #[tokio::test]
    async fn test_run_after_unit_exit_is_error() {
        let spawner = TokioSpawner::new();
        let unit = spawner.spawn();

        unit.join.abort();
        // Give the abort a chance to land
        let _ = tokio::time::timeout(std::time::Duration::from_millis(50), async {
            while !unit.join.is_finished() {
                tokio::task::yield_now().await;
            }
        })
        .await;

        let err = unit
            .handle
            .run(Task::new(TaskKind::ProcessData, json!(null)))
            .await
            .unwrap_err();
        assert!(err.message.contains("worker unit"));
    }
}
