//! The three publish stages, each a plain function whose output feeds the next.
//!
//! ```text
//! event ─serialize─► line ─seal─► envelope JSON ─wrap─► base64 blob ─append─► ack
//! ```
//!
//! A stage never logs or swallows its own failure; it returns a [`StageError`]
//! naming itself so the publisher can halt the chain at that point.

use common::protocol::Acknowledgment;
use serde::Serialize;
use thiserror::Error;

use super::log::{EventLog, LogError, LogRecord};
use crate::crypto::{CryptoBackendError, KeyCryptoService, StreamKey};

/// Failure of one pipeline stage.
#[derive(Debug, Error)]
pub enum StageError {
    /// The event or an intermediate value could not be encoded as JSON.
    #[error("JSON encoding failed: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Stage A: AES-256-CBC encryption of the serialised event.
    #[error("symmetric encryption failed: {0}")]
    SymmetricEncrypt(#[source] CryptoBackendError),

    /// Stage B: KMS wrap of the cipher envelope.
    #[error("key wrap failed: {0}")]
    KeyWrap(#[source] CryptoBackendError),

    /// Stage C: append to the stream.
    #[error("append failed: {0}")]
    Append(#[source] LogError),
}

impl StageError {
    /// Stable label used in log fields and metric attributes.
    pub fn stage(&self) -> &'static str {
        match self {
            StageError::Serialize(_) => "serialize",
            StageError::SymmetricEncrypt(_) => "symmetric_encrypt",
            StageError::KeyWrap(_) => "key_wrap",
            StageError::Append(_) => "append",
        }
    }
}

/// Encode `event` as a single newline-terminated JSON line.
pub fn serialize<E: Serialize + ?Sized>(event: &E) -> Result<String, StageError> {
    let mut line = serde_json::to_string(event).map_err(StageError::Serialize)?;
    line.push('\n');
    Ok(line)
}

/// Stage A: encrypt `line` under the stream key and encode the envelope as JSON.
pub fn seal(crypto: &KeyCryptoService, key: &StreamKey, line: &str) -> Result<String, StageError> {
    let envelope = crypto
        .symmetric_encrypt(key.as_bytes(), line)
        .map_err(StageError::SymmetricEncrypt)?;
    serde_json::to_string(&envelope).map_err(StageError::Serialize)
}

/// Stage B: wrap the envelope JSON with the configured KMS key.
pub async fn wrap(
    crypto: &KeyCryptoService,
    wrapping_key_id: &str,
    envelope_json: &str,
) -> Result<String, StageError> {
    crypto
        .wrap_encrypt(wrapping_key_id, envelope_json)
        .await
        .map_err(StageError::KeyWrap)
}

/// Stage C: append the wrapped blob under a fresh partition key and return the
/// acknowledgment as a JSON string.
pub async fn append(log: &dyn EventLog, stream_name: &str, wrapped: String) -> Result<String, StageError> {
    let record = LogRecord::new(stream_name, wrapped);
    let ack: Acknowledgment = log.append(record).await.map_err(StageError::Append)?;
    serde_json::to_string(&ack).map_err(StageError::Serialize)
}
