//! Middleware settings applied to the router.

use std::time::Duration;

/// Per-request timeout applied to all routes. Bounds how long a slow KMS or
/// Kinesis call can hold a client connection.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
