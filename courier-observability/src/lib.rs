//! Request logging for the Courier HTTP surface.
//!
//! [`interceptor::log_requests`] is an axum middleware that captures each
//! request/response pair, masks secrets, and hands the record to a
//! [`writer::RecordWriter`].

pub mod body;
pub mod exclusion;
pub mod interceptor;
pub mod masking;
pub mod metrics;
pub mod response;
pub mod writer;

pub use interceptor::{ErrorMessage, RequestLogger, log_requests};
pub use metrics::RequestLogMetrics;
pub use response::envelope_response;
pub use writer::RecordWriter;
