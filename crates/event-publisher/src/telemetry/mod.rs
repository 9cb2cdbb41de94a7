//! OpenTelemetry setup and publisher instruments.
//!
//! # Telemetry invariants
//!
//! - **No key material, event plaintext, or ciphertext** in any span attribute,
//!   metric label, or log field.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`); `RUST_LOG`
//!   overrides it.

pub mod init;
pub mod metrics;

pub use init::{init_telemetry, TelemetryGuard};
pub use metrics::PublishMetrics;
