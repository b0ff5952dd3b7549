use axum::response::{IntoResponse, Response};
use courier_core::envelope::Envelope;
use courier_core::error::CourierError;
use courier_observability::envelope_response;
use http::StatusCode;
use tracing::error;

/// Handler error rendered as a failure envelope.
#[derive(Debug)]
pub struct ApiError(pub CourierError);

impl From<CourierError> for ApiError {
    fn from(e: CourierError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self.0, "log query failed");
        }
        envelope_response(Envelope::failure(status, self.0.to_string()))
    }
}

pub type ApiResult = Result<Response, ApiError>;
