//! The durable append-only log the publisher writes to.

use async_trait::async_trait;
use bytes::Bytes;
use common::protocol::Acknowledgment;
use thiserror::Error;
use uuid::Uuid;

/// One record appended to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Destination stream.
    pub stream_name: String,
    /// Random UUIDv4. Spreads records across shards; carries no meaning.
    pub partition_key: String,
    /// Wrapped, base64-encoded payload.
    pub data: Bytes,
}

impl LogRecord {
    /// Build a record for `stream_name` with a freshly generated partition key.
    pub fn new(stream_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            stream_name: stream_name.into(),
            partition_key: Uuid::new_v4().to_string(),
            data: data.into(),
        }
    }
}

/// Errors from appending to the log.
#[derive(Debug, Error)]
pub enum LogError {
    /// The stream rejected the write because its throughput limit was hit.
    #[error("stream {stream} throttled the write: {message}")]
    Throttled { stream: String, message: String },

    /// Any other failure: stream missing, service unavailable, credentials.
    #[error("append to stream {stream} failed: {message}")]
    Append { stream: String, message: String },
}

/// Append-only log service.
///
/// Implemented for Kinesis Data Streams in [`crate::aws::KinesisEventLog`].
/// Implementations must be safe to call concurrently from many tasks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Append one record and return the log's receipt.
    async fn append(&self, record: LogRecord) -> Result<Acknowledgment, LogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_gets_random_uuid_partition_key() {
        let a = LogRecord::new("analytics-stream", "payload");
        let b = LogRecord::new("analytics-stream", "payload");
        assert_eq!(a.stream_name, "analytics-stream");
        assert_eq!(a.data, Bytes::from_static(b"payload"));
        assert!(Uuid::parse_str(&a.partition_key).is_ok());
        assert_ne!(a.partition_key, b.partition_key);
    }

    #[test]
    fn throttled_message_names_stream() {
        let e = LogError::Throttled {
            stream: "analytics-stream".into(),
            message: "rate exceeded".into(),
        };
        assert!(e.to_string().contains("analytics-stream"));
    }
}
