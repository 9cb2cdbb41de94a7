//! [`KeyCryptoService`]: envelope encryption through a key-management backend
//! plus the symmetric payload cipher.
//!
//! This is a thin wrapper. It never retries and never changes the kind of an
//! error: every failure is logged once here and returned to the caller as-is.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::protocol::CipherEnvelope;
use tracing::error;

use super::cipher;
use super::error::CryptoBackendError;

/// Key-management backend capable of wrapping and unwrapping small blobs.
///
/// Implemented for AWS KMS in [`crate::aws::AwsKms`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyManagement: Send + Sync {
    /// Encrypt `plaintext` under the master key `key_id`, returning the raw
    /// ciphertext blob.
    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Vec<u8>, CryptoBackendError>;

    /// Decrypt a ciphertext blob previously produced by [`KeyManagement::encrypt`].
    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoBackendError>;
}

/// All cryptographic transforms used by the publisher.
///
/// Cheap to clone; the backend handle is shared and never mutated.
#[derive(Clone)]
pub struct KeyCryptoService {
    kms: Arc<dyn KeyManagement>,
}

impl KeyCryptoService {
    /// Build a service over a shared key-management handle.
    pub fn new(kms: Arc<dyn KeyManagement>) -> Self {
        Self { kms }
    }

    /// Wrap `plaintext` with the master key `key_id` and return the blob as base64.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`CryptoBackendError`] unchanged.
    pub async fn wrap_encrypt(&self, key_id: &str, plaintext: &str) -> Result<String, CryptoBackendError> {
        let blob = self
            .kms
            .encrypt(key_id, plaintext.as_bytes())
            .await
            .inspect_err(|e| error!(error = %e, key_id, "key-wrap encrypt failed"))?;
        Ok(STANDARD.encode(blob))
    }

    /// Unwrap a base64 blob produced by [`KeyCryptoService::wrap_encrypt`].
    ///
    /// # Errors
    ///
    /// Returns [`CryptoBackendError::InvalidBase64`] for malformed input, or the
    /// backend's error unchanged.
    pub async fn wrap_decrypt(&self, ciphertext_b64: &str) -> Result<Vec<u8>, CryptoBackendError> {
        let blob = STANDARD
            .decode(ciphertext_b64)
            .map_err(|_| CryptoBackendError::InvalidBase64("wrapped ciphertext"))
            .inspect_err(|e| error!(error = %e, "key-wrap decrypt failed"))?;

        self.kms
            .decrypt(&blob)
            .await
            .inspect_err(|e| error!(error = %e, "key-wrap decrypt failed"))
    }

    /// Encrypt `plaintext` with AES-256-CBC under `key` and a fresh IV.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoBackendError::InvalidKeyLength`] for a key that is not 32 bytes.
    pub fn symmetric_encrypt(&self, key: &[u8], plaintext: &str) -> Result<CipherEnvelope, CryptoBackendError> {
        cipher::encrypt(key, plaintext)
            .inspect_err(|e| error!(error = %e, "symmetric encrypt failed"))
    }

    /// Reverse [`KeyCryptoService::symmetric_encrypt`].
    ///
    /// # Errors
    ///
    /// Returns a [`CryptoBackendError`] on any format or cipher failure.
    pub fn symmetric_decrypt(
        &self,
        key: &[u8],
        iv_b64: &str,
        ciphertext_b64: &str,
    ) -> Result<String, CryptoBackendError> {
        cipher::decrypt(key, iv_b64, ciphertext_b64)
            .inspect_err(|e| error!(error = %e, "symmetric decrypt failed"))
    }
}
