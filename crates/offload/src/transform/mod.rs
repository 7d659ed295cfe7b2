//! Pluggable value transforms for the persistence layer
//!
//! This module provides:
//! - [`ValueTransform`] - Strategy trait applied symmetrically on write/read
//! - [`Identity`] - Pass-through default
//! - [`Zstd`] - Compression codec
//! - [`AesGcm`] - AES-256-GCM encryption
//!
//! Transforms are applied to the serialized value bytes in configuration
//! order on write and in reverse order on read, so any chain round-trips
//! without the transforms knowing about each other.

mod compression;
mod encryption;

pub use compression::Zstd;
pub use encryption::{generate_key, AesGcm};

/// Error raised by a value transform
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{transform}: {message}")]
pub struct TransformError {
    /// Name of the transform that failed
    pub transform: String,

    /// Human-readable description
    pub message: String,
}

impl TransformError {
    pub fn new(transform: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            transform: transform.into(),
            message: message.into(),
        }
    }
}

/// A symmetric transform over stored value bytes
///
/// Implementations must uphold `decode(encode(v)) == v` for all `v`.
pub trait ValueTransform: Send + Sync {
    /// Short name used in error reports
    fn name(&self) -> &str;

    /// Applied on the write path
    fn encode(&self, value: Vec<u8>) -> Result<Vec<u8>, TransformError>;

    /// Applied on the read path
    fn decode(&self, value: Vec<u8>) -> Result<Vec<u8>, TransformError>;
}

/// Pass-through transform
///
/// The default behavior when no real codec is configured: both directions
/// return the input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl ValueTransform for Identity {
    fn name(&self) -> &str {
        "identity"
    }

    fn encode(&self, value: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        Ok(value)
    }

    fn decode(&self, value: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_round_trip() {
        let transform = Identity;
        let input = b"unchanged".to_vec();
        let encoded = transform.encode(input.clone()).unwrap();
        assert_eq!(encoded, input);
        assert_eq!(transform.decode(encoded).unwrap(), input);
    }

    #[test]
    fn test_transform_error_display() {
        let err = TransformError::new("zstd", "truncated frame");
        assert_eq!(err.to_string(), "zstd: truncated frame");
    }
}
