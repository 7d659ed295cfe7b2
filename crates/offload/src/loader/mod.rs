//! Resource loading with retries and cache-freshness metadata
//!
//! This module provides:
//! - [`ResourceLoader`] - Fetch-via-producer with exponential-backoff retries
//! - [`CacheRecord`] - Cached value tagged with staleness/GC windows
//! - [`ResourceOptions`] - Staleness, GC and retry configuration
//!
//! The loader writes each successful fetch into the store as a
//! [`CacheRecord`] under a key derived from the write time. The staleness
//! and garbage-collection windows are advisory metadata for whoever reads
//! the store; the loader itself never revalidates or purges by them.

mod record;
mod resource;

pub use record::{CacheRecord, Freshness};
pub use resource::{LoadStatus, ResourceLoadError, ResourceLoader, ResourceOptions};
