//! The resource loader: producer + retry loop + cache write

use std::future::Future;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use super::record::CacheRecord;
use crate::persistence::ResourceStore;
use crate::reliability::RetryPolicy;

/// Options controlling a resource loader
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use offload::loader::ResourceOptions;
/// use offload::reliability::RetryPolicy;
///
/// let options = ResourceOptions::default()
///     .with_stale_time(Duration::from_secs(30))
///     .with_retry(RetryPolicy::exponential().with_max_attempts(5));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceOptions {
    /// Staleness window written into each cache record
    pub stale_time: Duration,

    /// Garbage-collection horizon written into each cache record
    pub gc_time: Duration,

    /// Retry policy for the producer
    pub retry: RetryPolicy,
}

impl Default for ResourceOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            gc_time: Duration::from_secs(5 * 60),
            retry: RetryPolicy::exponential(),
        }
    }
}

impl ResourceOptions {
    /// Set the staleness window
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    /// Set the garbage-collection horizon
    pub fn with_gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Loader state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// No load has run yet
    Idle,

    /// A load is in flight
    Loading,

    /// The last load resolved
    Success,

    /// The last load exhausted its retries
    Failed,
}

/// Error returned once all retries are exhausted
///
/// Wraps the last producer (or persist) error; intermediate failures only
/// drive the backoff loop.
#[derive(Debug, thiserror::Error)]
#[error("resource load failed after {attempts} attempt(s): {source}")]
pub struct ResourceLoadError {
    /// Producer attempts actually made
    pub attempts: u32,

    /// The final underlying error
    #[source]
    pub source: anyhow::Error,
}

/// Loads a resource via a caller-supplied async producer, caching the result
///
/// Each successful load is persisted as a [`CacheRecord`] under a key derived
/// from the write time (millisecond timestamp), so a failed reload never
/// disturbs a previously cached value. Retries are strictly sequential with
/// exponential backoff between attempts.
///
/// In-flight loads cannot be cancelled; a caller can only drop the future.
///
/// # Example
///
/// ```ignore
/// use offload::loader::{ResourceLoader, ResourceOptions};
///
/// let loader = ResourceLoader::new(store, ResourceOptions::default());
/// let profile: Profile = loader.load(|| fetch_profile(user_id)).await?;
/// ```
pub struct ResourceLoader {
    store: ResourceStore,
    options: ResourceOptions,
    status: RwLock<LoadStatus>,
    last_error: RwLock<Option<String>>,
}

impl ResourceLoader {
    /// Create a loader writing into `store`
    pub fn new(store: ResourceStore, options: ResourceOptions) -> Self {
        Self {
            store,
            options,
            status: RwLock::new(LoadStatus::Idle),
            last_error: RwLock::new(None),
        }
    }

    /// Current position in the load state machine
    pub fn status(&self) -> LoadStatus {
        *self.status.read()
    }

    /// Message of the last retained error, if the last load failed
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// The options this loader stamps into cache records
    pub fn options(&self) -> &ResourceOptions {
        &self.options
    }

    /// Fetch a value via `producer`, retrying on failure, and cache it
    ///
    /// An attempt covers both the producer call and the cache write: a
    /// persist failure is retried like a producer failure. With a retry
    /// budget of zero the producer is never invoked.
    #[instrument(skip_all, fields(max_attempts = self.options.retry.max_attempts))]
    pub async fn load<T, F, Fut>(&self, producer: F) -> Result<T, ResourceLoadError>
    where
        T: Serialize + Clone,
        F: Fn() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        *self.status.write() = LoadStatus::Loading;
        *self.last_error.write() = None;

        let policy = &self.options.retry;
        let mut attempts: u32 = 0;

        while policy.has_attempts_remaining(attempts) {
            match self.attempt(&producer).await {
                Ok(data) => {
                    debug!(attempts = attempts + 1, "resource loaded");
                    *self.status.write() = LoadStatus::Success;
                    return Ok(data);
                }
                Err(err) => {
                    attempts += 1;
                    if !policy.has_attempts_remaining(attempts) {
                        warn!(attempts, error = %err, "retries exhausted");
                        return Err(self.fail(attempts, err));
                    }

                    let delay = policy.delay_after_failure(attempts);
                    debug!(attempts, delay_ms = delay.as_millis() as u64, "attempt failed, backing off");
                    tokio::time::sleep(delay).await;
                }
            }
        }

        // Zero-attempt budget: the producer was never invoked
        Err(self.fail(
            0,
            anyhow::anyhow!("retry budget is zero; producer was never attempted"),
        ))
    }

    /// One attempt: produce the value, then persist its cache record
    async fn attempt<T, F, Fut>(&self, producer: &F) -> anyhow::Result<T>
    where
        T: Serialize + Clone,
        F: Fn() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let data = producer().await?;

        let record = CacheRecord::new(data.clone(), self.options.stale_time, self.options.gc_time);
        let cache_key = record.timestamp.timestamp_millis().to_string();
        self.store.set(&cache_key, &record).await?;

        Ok(data)
    }

    fn fail(&self, attempts: u32, err: anyhow::Error) -> ResourceLoadError {
        *self.last_error.write() = Some(err.to_string());
        *self.status.write() = LoadStatus::Failed;
        ResourceLoadError {
            attempts,
            source: err,
        }
    }
}
