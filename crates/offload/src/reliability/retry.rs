//! Retry policy implementation

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Configuration for producer retries
///
/// Supports exponential backoff, attempt-indexed with base 2 by default:
/// the delay after the i-th consecutive failure is `initial * coefficient^i`.
///
/// # Example
///
/// ```
/// use offload::reliability::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::exponential().with_max_attempts(3);
///
/// // First retry after 2 seconds
/// // Second retry after 4 seconds
/// assert_eq!(policy.delay_after_failure(1), Duration::from_secs(2));
/// assert_eq!(policy.delay_after_failure(2), Duration::from_secs(4));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of producer attempts (zero means never attempt)
    pub max_attempts: u32,

    /// Base interval the backoff grows from
    #[serde(with = "duration_millis")]
    pub initial_interval: Duration,

    /// Optional cap on the delay between attempts
    #[serde(default, with = "opt_duration_millis")]
    pub max_interval: Option<Duration>,

    /// Backoff multiplier (e.g., 2.0 for exponential)
    pub backoff_coefficient: f64,

    /// Jitter factor (0.0-1.0) to add randomness
    ///
    /// A value of 0.1 means ±10% randomness. Zero keeps the schedule exact.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential()
    }
}

impl RetryPolicy {
    /// Create an exponential backoff retry policy with sensible defaults
    ///
    /// - 3 max attempts
    /// - 1 second base interval
    /// - 2x backoff coefficient
    /// - no delay cap, no jitter
    pub fn exponential() -> Self {
        Self {
            max_attempts: 3,
            initial_interval: Duration::from_secs(1),
            max_interval: None,
            backoff_coefficient: 2.0,
            jitter: 0.0,
        }
    }

    /// Create a policy that never attempts the producer
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            initial_interval: Duration::ZERO,
            max_interval: None,
            backoff_coefficient: 1.0,
            jitter: 0.0,
        }
    }

    /// Create a policy with fixed intervals (no backoff growth)
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_interval: interval,
            max_interval: Some(interval),
            backoff_coefficient: 1.0,
            jitter: 0.0,
        }
    }

    /// Set the maximum number of attempts
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the base interval
    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    /// Cap the delay between attempts
    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = Some(interval);
        self
    }

    /// Set the backoff coefficient
    pub fn with_backoff_coefficient(mut self, coefficient: f64) -> Self {
        self.backoff_coefficient = coefficient;
        self
    }

    /// Set the jitter factor (0.0-1.0)
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Delay to wait after `failures` consecutive failures (1-based)
    ///
    /// Uncapped schedules eventually outgrow what a `Duration` can hold;
    /// the delay saturates at `Duration::MAX` instead of overflowing.
    pub fn delay_after_failure(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }

        let mut delay = self.initial_interval.as_secs_f64()
            * self.backoff_coefficient.powi(failures as i32);
        if let Some(max) = self.max_interval {
            delay = delay.min(max.as_secs_f64());
        }

        if self.jitter > 0.0 {
            let jitter_range = delay * self.jitter;
            if jitter_range > 0.0 && jitter_range.is_finite() {
                let mut rng = rand::thread_rng();
                let jitter_offset = rng.gen_range(-jitter_range..jitter_range);
                delay = (delay + jitter_offset).max(0.0);
            }
        }

        Duration::try_from_secs_f64(delay).unwrap_or(Duration::MAX)
    }

    /// Check whether another attempt is allowed after `attempts_made`
    pub fn has_attempts_remaining(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

/// Serde support for Duration as milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Serde support for Option<Duration> as milliseconds
mod opt_duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.map(|d| d.as_millis()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}
