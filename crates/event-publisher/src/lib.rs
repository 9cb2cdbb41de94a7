//! Encrypted event publisher.
//!
//! Events are serialised to JSON, encrypted with AES-256-CBC under a per-stream
//! key, wrapped with AWS KMS, and appended to a Kinesis stream under a random
//! partition key. Publishing is best-effort: callers of
//! [`SecureEventPublisher::write_event`] never see an error.

pub mod aws;
pub mod config;
pub mod crypto;
pub mod publisher;
pub mod server;
pub mod telemetry;

pub use crypto::{CryptoBackendError, KeyCryptoService};
pub use publisher::{PublisherConfig, SecureEventPublisher};
