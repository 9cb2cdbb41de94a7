//! Axum request handlers for all service endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use common::protocol::{HealthResponse, PublishResponse};
use common::ServiceError;
use tracing::{debug, error};

use super::state::AppState;

/// `POST /events`: encrypt and publish one JSON event.
///
/// Always answers `202 Accepted` for well-formed JSON. `acknowledgment` is null
/// when publishing is disabled or the pipeline halted; the reason is in the
/// service logs, not the response.
///
/// The pipeline runs on its own task, so a dropped request (client disconnect
/// or request timeout) does not cancel an event that is already in flight.
pub async fn publish(State(state): State<AppState>, body: Bytes) -> Response {
    let event: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "rejected non-JSON event body");
            return error_response(ServiceError::BadRequest(format!(
                "body is not valid JSON: {e}"
            )));
        }
    };

    let acknowledgment = match state.publisher.spawn_event(event).await {
        Ok(ack) => ack,
        Err(e) => {
            error!(error = %e, "publish task did not complete");
            None
        }
    };
    (StatusCode::ACCEPTED, Json(PublishResponse { acknowledgment })).into_response()
}

/// `GET /health`: liveness check.
///
/// A disabled publisher is a valid configuration, so this is always `200 OK`.
pub async fn health(State(state): State<AppState>) -> Response {
    let body = HealthResponse {
        status: "ok".into(),
        publishing_enabled: state.publisher.is_enabled(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> Response {
    error_response(ServiceError::NotFound(
        "the requested resource does not exist".into(),
    ))
}

fn error_response(err: ServiceError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(err.to_response())).into_response()
}
