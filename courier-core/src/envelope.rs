//! Uniform `{status, message, data, options}` response wrapper.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Operation Successfully Done.";
pub const DEFAULT_FAILURE_MESSAGE: &str = "Operation failed.";

/// Error code carried in every failure payload.
pub const FAILURE_ERROR_CODE: u32 = 666;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EnvelopeStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NOK")]
    Nok,
}

/// Response body shared by every endpoint.
///
/// The HTTP status travels alongside the body and is always consistent with
/// it: success envelopes carry a 2xx/3xx status, failures a 4xx/5xx one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub status: EnvelopeStatus,
    pub message: String,
    pub data: Value,
    pub options: Value,
    #[serde(skip)]
    http_status: u16,
}

impl Envelope {
    /// Success envelope. Statuses outside 200–399 become 202.
    pub fn success(status: StatusCode, data: Value, options: Value) -> Self {
        let code = status.as_u16();
        let http_status = if (200..=399).contains(&code) { code } else { 202 };
        Self {
            status: EnvelopeStatus::Ok,
            message: DEFAULT_SUCCESS_MESSAGE.to_string(),
            data: empty_object_if_null(data),
            options: empty_object_if_null(options),
            http_status,
        }
    }

    /// Failure envelope. Statuses outside 400–599 become 500.
    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        let code = status.as_u16();
        let http_status = if (400..=599).contains(&code) { code } else { 500 };
        Self {
            status: EnvelopeStatus::Nok,
            message: message.into(),
            data: json!({ "isAvailable": false, "error_code": FAILURE_ERROR_CODE }),
            options: json!({}),
            http_status,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn http_status(&self) -> StatusCode {
        StatusCode::from_u16(self.http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn is_success(&self) -> bool {
        self.status == EnvelopeStatus::Ok
    }
}

fn empty_object_if_null(value: Value) -> Value {
    if value.is_null() { json!({}) } else { value }
}
