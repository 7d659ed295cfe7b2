//! Cache record and freshness windows

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a cached value sits in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// Younger than the staleness window; usable as-is
    Fresh,

    /// Past the staleness window; eligible for background revalidation
    Stale,

    /// Past the garbage-collection horizon; eligible for eviction
    Expired,
}

/// A cached value tagged with lifecycle metadata
///
/// `stale_time <= gc_time` is expected but not enforced. The windows are
/// advisory: nothing in this crate sweeps expired records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord<T> {
    /// The cached value
    pub data: T,

    /// When the value was produced
    pub timestamp: DateTime<Utc>,

    /// Staleness window
    #[serde(with = "duration_millis")]
    pub stale_time: Duration,

    /// Garbage-collection horizon
    #[serde(with = "duration_millis")]
    pub gc_time: Duration,
}

impl<T> CacheRecord<T> {
    /// Create a record stamped with the current time
    pub fn new(data: T, stale_time: Duration, gc_time: Duration) -> Self {
        Self {
            data,
            timestamp: Utc::now(),
            stale_time,
            gc_time,
        }
    }

    /// Age of the record at `now`
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.timestamp).to_std().unwrap_or(Duration::ZERO)
    }

    /// Lifecycle position of the record at `now`
    pub fn freshness(&self, now: DateTime<Utc>) -> Freshness {
        let age = self.age(now);
        if age < self.stale_time {
            Freshness::Fresh
        } else if age < self.gc_time {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
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
