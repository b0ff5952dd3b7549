use axum::response::Response;
use courier_core::envelope::Envelope;
use courier_observability::envelope_response;
use http::StatusCode;
use serde_json::json;

pub const HEALTHY_MESSAGE: &str = "System is healthy";

/// `GET /health-check/`: liveness only, touches no store.
pub async fn health_check() -> Response {
    envelope_response(
        Envelope::success(StatusCode::OK, json!(true), json!({})).with_message(HEALTHY_MESSAGE),
    )
}

/// Unrouted paths answer with the not-found envelope.
pub async fn not_found() -> Response {
    envelope_response(Envelope::failure(StatusCode::NOT_FOUND, "Not found."))
}
