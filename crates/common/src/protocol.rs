//! Types that cross a process boundary: the encrypted envelope written to the
//! event stream and the JSON bodies of the HTTP ingest API.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Stream payload
// ---------------------------------------------------------------------------

/// Output of the symmetric-cipher stage.
///
/// Both fields are standard base64 (padded). The IV is not secret; it travels
/// with the ciphertext so consumers can decrypt with the shared stream key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherEnvelope {
    /// AES-256-CBC ciphertext (PKCS#7 padded).
    pub ciphertext: String,
    /// 16-byte initialization vector used for this message only.
    pub iv: String,
}

/// Receipt returned by the event log after a record was appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Acknowledgment {
    /// Shard the record landed on.
    pub shard_id: String,
    /// Sequence number assigned by the shard.
    pub sequence_number: String,
}

// ---------------------------------------------------------------------------
// Ingest endpoint
// ---------------------------------------------------------------------------

/// Response body for `POST /events`.
///
/// `acknowledgment` is `null` when publishing is disabled or when the
/// pipeline halted; the two cases are indistinguishable to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResponse {
    /// Serialised [`Acknowledgment`], if the record was appended.
    pub acknowledgment: Option<String>,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process is serving.
    pub status: String,
    /// Whether a destination stream is configured.
    pub publishing_enabled: bool,
}
