//! Axum HTTP ingest server.
//!
//! # Responsibilities
//! - Define the router with all routes and shared middleware.
//! - Hand request bodies to the shared [`SecureEventPublisher`](crate::publisher::SecureEventPublisher).

pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
