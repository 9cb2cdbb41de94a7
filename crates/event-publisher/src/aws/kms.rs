//! [`KeyManagement`] backed by AWS KMS `Encrypt` / `Decrypt`.

use async_trait::async_trait;
use aws_sdk_kms::error::DisplayErrorContext;
use aws_sdk_kms::primitives::Blob;

use crate::crypto::{CryptoBackendError, KeyManagement};

/// AWS KMS key-management backend.
#[derive(Clone, Debug)]
pub struct AwsKms {
    client: aws_sdk_kms::Client,
}

impl AwsKms {
    /// Wrap a shared KMS client.
    pub fn new(client: aws_sdk_kms::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl KeyManagement for AwsKms {
    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Vec<u8>, CryptoBackendError> {
        let resp = self
            .client
            .encrypt()
            .key_id(key_id)
            .plaintext(Blob::new(plaintext))
            .send()
            .await
            .map_err(|e| CryptoBackendError::Backend(DisplayErrorContext(&e).to_string()))?;

        resp.ciphertext_blob()
            .map(|b| b.as_ref().to_vec())
            .ok_or(CryptoBackendError::EmptyResponse("ciphertext blob"))
    }

    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoBackendError> {
        // Symmetric KMS ciphertext embeds the key id, so none is passed here.
        let resp = self
            .client
            .decrypt()
            .ciphertext_blob(Blob::new(ciphertext))
            .send()
            .await
            .map_err(|e| CryptoBackendError::Backend(DisplayErrorContext(&e).to_string()))?;

        resp.plaintext()
            .map(|b| b.as_ref().to_vec())
            .ok_or(CryptoBackendError::EmptyResponse("plaintext"))
    }
}
