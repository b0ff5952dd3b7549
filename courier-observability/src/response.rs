use crate::interceptor::ErrorMessage;
use axum::Json;
use axum::response::{IntoResponse, Response};
use courier_core::envelope::Envelope;

/// Render an envelope with its HTTP status.
///
/// Failure envelopes also carry their message as an [`ErrorMessage`]
/// extension so the interceptor can store it on the log record.
pub fn envelope_response(envelope: Envelope) -> Response {
    let status = envelope.http_status();
    let error = (!envelope.is_success()).then(|| ErrorMessage(envelope.message.clone()));
    let mut response = (status, Json(envelope)).into_response();
    if let Some(error) = error {
        response.extensions_mut().insert(error);
    }
    response
}
