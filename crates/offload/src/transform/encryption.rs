//! AES-256-GCM encryption transform

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;

use super::{TransformError, ValueTransform};

const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;

/// AES-256-GCM encryption applied to stored values
///
/// Each encode generates a fresh random nonce, prepended to the ciphertext
/// (which includes the auth tag), so the same plaintext encrypts differently
/// every time while remaining self-contained for decode.
///
/// # Example
///
/// ```
/// use offload::transform::{generate_key, AesGcm, ValueTransform};
///
/// let key = generate_key();
/// let cipher = AesGcm::from_base64_key(&key).unwrap();
/// let sealed = cipher.encode(b"secret".to_vec()).unwrap();
/// assert_eq!(cipher.decode(sealed).unwrap(), b"secret");
/// ```
#[derive(Clone)]
pub struct AesGcm {
    cipher: Aes256Gcm,
}

impl AesGcm {
    /// Create from a raw 32-byte key
    pub fn new(key: &[u8]) -> Result<Self, TransformError> {
        if key.len() != KEY_SIZE {
            return Err(TransformError::new(
                "aes-gcm",
                format!("key must be {} bytes, got {}", KEY_SIZE, key.len()),
            ));
        }
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| TransformError::new("aes-gcm", e.to_string()))?;
        Ok(Self { cipher })
    }

    /// Create from a base64-encoded 32-byte key
    pub fn from_base64_key(key: &str) -> Result<Self, TransformError> {
        let key_bytes = BASE64
            .decode(key)
            .map_err(|e| TransformError::new("aes-gcm", format!("invalid base64 key: {e}")))?;
        Self::new(&key_bytes)
    }
}

impl ValueTransform for AesGcm {
    fn name(&self) -> &str {
        "aes-gcm"
    }

    fn encode(&self, value: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, value.as_slice())
            .map_err(|e| TransformError::new("aes-gcm", format!("encryption failed: {e}")))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn decode(&self, value: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        if value.len() < NONCE_SIZE {
            return Err(TransformError::new("aes-gcm", "sealed value too short"));
        }
        let (nonce_bytes, ciphertext) = value.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.cipher.decrypt(nonce, ciphertext).map_err(|e| {
            TransformError::new(
                "aes-gcm",
                format!("decryption failed (data may be corrupted): {e}"),
            )
        })
    }
}

/// Generate a new random encryption key, base64-encoded
pub fn generate_key() -> String {
    let mut key = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut key);
    BASE64.encode(key)
}
