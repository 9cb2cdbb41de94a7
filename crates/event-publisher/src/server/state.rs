//! Shared application state injected into every Axum handler.

use crate::publisher::SecureEventPublisher;

/// Application state shared across all request handlers.
///
/// The publisher is `Arc`-backed, so Axum's per-request clone is cheap.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Encrypting publisher for ingested events.
    pub publisher: SecureEventPublisher,
}

impl AppState {
    /// Create a new [`AppState`] around `publisher`.
    pub fn new(publisher: SecureEventPublisher) -> Self {
        Self { publisher }
    }
}

#[cfg(test)]
impl Default for AppState {
    /// State with a disabled publisher.
    fn default() -> Self {
        Self::new(SecureEventPublisher::disabled())
    }
}
