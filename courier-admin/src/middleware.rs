use crate::response::ApiError;
use crate::server::AdminState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use courier_core::error::CourierError;
use std::sync::Arc;
use tracing::debug;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Admin API key authentication middleware.
///
/// Pass-through when no key is configured.
pub async fn api_key_auth(
    State(state): State<Arc<AdminState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(ref expected) = state.api_key else {
        return next.run(request).await;
    };

    let authorized = request
        .headers()
        .get(API_KEY_HEADER)
        .is_some_and(|v| keys_match(v.as_bytes(), expected.as_bytes()));
    if !authorized {
        debug!(path = %request.uri().path(), "rejected request without valid API key");
        return ApiError(CourierError::Unauthorized).into_response();
    }
    next.run(request).await
}

/// Byte comparison whose running time depends only on the lengths.
fn keys_match(provided: &[u8], expected: &[u8]) -> bool {
    if provided.len() != expected.len() {
        return false;
    }
    provided
        .iter()
        .zip(expected)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}
