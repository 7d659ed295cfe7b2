//! Reliability patterns for resource loading
//!
//! This module provides:
//! - [`RetryPolicy`] - Configurable retry with exponential backoff

mod retry;

pub use retry::RetryPolicy;
