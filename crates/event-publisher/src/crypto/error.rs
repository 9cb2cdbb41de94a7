use thiserror::Error;

use super::cipher::{IV_LEN, KEY_LEN};

/// Errors produced by KMS calls and by the symmetric cipher.
///
/// [`KeyCryptoService`](super::KeyCryptoService) logs each of these once where it
/// occurs and hands it back unchanged.
#[derive(Debug, Error)]
pub enum CryptoBackendError {
    /// The key-management backend rejected the call or was unreachable.
    #[error("key management call failed: {0}")]
    Backend(String),

    /// The key-management backend answered without the expected blob.
    #[error("key management response contained no {0}")]
    EmptyResponse(&'static str),

    /// Symmetric key material is not [`KEY_LEN`] bytes.
    #[error("invalid key length: expected {KEY_LEN} bytes, got {0}")]
    InvalidKeyLength(usize),

    /// Decoded IV is not [`IV_LEN`] bytes.
    #[error("invalid IV length: expected {IV_LEN} bytes, got {0}")]
    InvalidIvLength(usize),

    /// An input that must be base64 was not.
    #[error("{0} is not valid base64")]
    InvalidBase64(&'static str),

    /// CBC decryption failed: wrong key, truncated or corrupt ciphertext.
    #[error("cipher operation failed")]
    Cipher,

    /// Decrypted bytes are not UTF-8 text.
    #[error("decrypted plaintext is not valid UTF-8")]
    InvalidUtf8,
}
