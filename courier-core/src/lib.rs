pub mod config;
pub mod envelope;
pub mod error;
pub mod log_query;
pub mod log_record;

pub use config::CourierConfig;
pub use envelope::Envelope;
pub use error::CourierError;
pub use log_query::{LogPage, LogQuery, LogQueryParams};
pub use log_record::{LogRecord, LogRecordView, NewLogRecord};
