//! The fixed task API exposed by every worker unit

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Task kinds a worker unit can execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    ProcessData,
    ComputeHash,
    Compress,
    Encrypt,
}

impl TaskKind {
    /// All task kinds, in API order
    pub const ALL: [TaskKind; 4] = [
        TaskKind::ProcessData,
        TaskKind::ComputeHash,
        TaskKind::Compress,
        TaskKind::Encrypt,
    ];
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProcessData => write!(f, "process_data"),
            Self::ComputeHash => write!(f, "compute_hash"),
            Self::Compress => write!(f, "compress"),
            Self::Encrypt => write!(f, "encrypt"),
        }
    }
}

/// A single unit of work dispatched to a worker unit
///
/// Ephemeral: exists only for the duration of one dispatch call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub kind: TaskKind,
    pub payload: Value,
}

impl Task {
    pub fn new(kind: TaskKind, payload: Value) -> Self {
        Self { kind, payload }
    }
}

/// Error raised by a task handler
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TaskError {
    pub message: String,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Task execution result
pub type TaskResult = Result<Value, TaskError>;

/// Task handler function type
pub type TaskHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, TaskResult> + Send + Sync>;

/// Canonical SHA-256 of the UTF-8 encoding of `data`, as lowercase hex
///
/// Two characters per byte, most-significant byte first. This is the one
/// bit-exact contract in the task API.
pub fn sha256_hex(data: &str) -> String {
    hex::encode(Sha256::digest(data.as_bytes()))
}

/// The handler table installed in every worker unit
///
/// `compute_hash` digests string payloads; `process_data`, `compress` and
/// `encrypt` are identity pass-throughs by default — extension points a
/// caller overrides with [`WorkerApi::with_handler`], not unimplemented
/// stubs.
///
/// # Example
///
/// ```
/// use offload::worker::{TaskKind, WorkerApi};
/// use serde_json::json;
///
/// let api = WorkerApi::new().with_handler(TaskKind::ProcessData, |payload| async move {
///     Ok(json!({ "wrapped": payload }))
/// });
/// ```
#[derive(Clone)]
pub struct WorkerApi {
    handlers: HashMap<TaskKind, TaskHandler>,
}

impl Default for WorkerApi {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerApi {
    /// Create the default handler table
    pub fn new() -> Self {
        let mut api = Self {
            handlers: HashMap::new(),
        };

        api = api.with_handler(TaskKind::ProcessData, |payload| async move { Ok(payload) });
        api = api.with_handler(TaskKind::ComputeHash, |payload| async move {
            match payload {
                Value::String(data) => Ok(Value::String(sha256_hex(&data))),
                _ => Err(TaskError::new("compute_hash expects a string payload")),
            }
        });
        api = api.with_handler(TaskKind::Compress, |payload| async move { Ok(payload) });
        api = api.with_handler(TaskKind::Encrypt, |payload| async move { Ok(payload) });

        api
    }

    /// Install or replace the handler for a task kind
    pub fn with_handler<F, Fut>(mut self, kind: TaskKind, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        let handler: TaskHandler = Arc::new(move |payload| Box::pin(handler(payload)));
        self.handlers.insert(kind, handler);
        self
    }

    /// Execute a task with the installed handler
    pub async fn execute(&self, task: Task) -> TaskResult {
        match self.handlers.get(&task.kind) {
            Some(handler) => handler(task.payload).await,
            None => Err(TaskError::new(format!(
                "no handler installed for task kind: {}",
                task.kind
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_sha256_hex_empty_string() {
        assert_eq!(sha256_hex(""), EMPTY_SHA256);
    }

    #[test]
    fn test_sha256_hex_known_value() {
        assert_eq!(
            sha256_hex("hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_sha256_hex_deterministic() {
        assert_eq!(sha256_hex("same input"), sha256_hex("same input"));
        assert_eq!(sha256_hex("payload").len(), 64);
    }

    #[tokio::test]
    async fn test_compute_hash_handler() {
        let api = WorkerApi::new();
        let result = api
            .execute(Task::new(TaskKind::ComputeHash, json!("")))
            .await
            .unwrap();
        assert_eq!(result, json!(EMPTY_SHA256));
    }

    #[tokio::test]
    async fn test_compute_hash_rejects_non_string() {
        let api = WorkerApi::new();
        let err = api
            .execute(Task::new(TaskKind::ComputeHash, json!({"not": "a string"})))
            .await
            .unwrap_err();
        assert!(err.message.contains("string payload"));
    }

    #[tokio::test]
    async fn test_pass_through_defaults() {
        let api = WorkerApi::new();
        let payload = json!({"rows": [1, 2, 3]});

        for kind in [TaskKind::ProcessData, TaskKind::Compress, TaskKind::Encrypt] {
            let result = api
                .execute(Task::new(kind, payload.clone()))
                .await
                .unwrap();
            assert_eq!(result, payload);
        }
    }

    #[tokio::test]
    async fn test_handler_override() {
        let api = WorkerApi::new().with_handler(TaskKind::ProcessData, |payload| async move {
            Ok(json!({ "processed": payload }))
        });

        let result = api
            .execute(Task::new(TaskKind::ProcessData, json!(1)))
            .await
            .unwrap();
        assert_eq!(result, json!({ "processed": 1 }));
    }

    #[test]
    fn test_task_kind_display() {
        assert_eq!(TaskKind::ComputeHash.to_string(), "compute_hash");
        assert_eq!(TaskKind::ALL.len(), 4);
    }
}
