//! Wire types and errors shared across `event-publisher` crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
