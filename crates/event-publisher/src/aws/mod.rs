//! AWS SDK adapters: KMS as the key-management backend and Kinesis Data
//! Streams as the durable event log.
//!
//! Clients are built once at startup and shared as read-only handles; nothing
//! here re-creates a client per call.

pub mod clients;
pub mod kinesis;
pub mod kms;

pub use clients::AwsClients;
pub use kinesis::KinesisEventLog;
pub use kms::AwsKms;
