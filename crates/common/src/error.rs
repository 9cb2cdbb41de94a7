//! Errors surfaced to HTTP callers of the ingest service.

use thiserror::Error;

use crate::protocol::ErrorResponse;

/// Errors returned by the HTTP ingest surface.
///
/// Publishing failures never appear here: the publisher absorbs them and only
/// logs. These variants cover requests the service refuses outright.
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::NotFound`] → 404
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request body could not be parsed as JSON.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No route matches the request.
    #[error("not found: {0}")]
    NotFound(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::NotFound(_) => 404,
        }
    }

    /// Short machine-readable code used in [`ErrorResponse::code`].
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::NotFound(_) => "not_found",
        }
    }

    /// Build the JSON error body for this error.
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            ServiceError::BadRequest(m) | ServiceError::NotFound(m) => m.clone(),
        };
        ErrorResponse::new(self.code(), message)
    }
}
