//! Zstandard compression transform

use super::{TransformError, ValueTransform};

const DEFAULT_LEVEL: i32 = 3;

/// Zstandard compression applied to stored values
///
/// # Example
///
/// ```
/// use offload::transform::{Zstd, ValueTransform};
///
/// let codec = Zstd::default();
/// let compressed = codec.encode(b"aaaaaaaaaaaaaaaa".to_vec()).unwrap();
/// let restored = codec.decode(compressed).unwrap();
/// assert_eq!(restored, b"aaaaaaaaaaaaaaaa");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Zstd {
    level: i32,
}

impl Zstd {
    /// Create a codec with an explicit compression level
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Default for Zstd {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL)
    }
}

impl ValueTransform for Zstd {
    fn name(&self) -> &str {
        "zstd"
    }

    fn encode(&self, value: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        zstd::encode_all(value.as_slice(), self.level)
            .map_err(|e| TransformError::new("zstd", e.to_string()))
    }

    fn decode(&self, value: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        zstd::decode_all(value.as_slice())
            .map_err(|e| TransformError::new("zstd", e.to_string()))
    }
}
