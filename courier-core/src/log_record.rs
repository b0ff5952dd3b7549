use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One observed HTTP request/response exchange.
///
/// Created once by the request interceptor and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: i64,
    /// Assigned by the store at write time.
    pub timestamp: DateTime<Utc>,
    pub path: String,
    pub method: String,
    pub request_data: Option<Value>,
    pub response_data: Option<Value>,
    pub status_code: u16,
    /// Seconds from interceptor entry to response availability.
    pub duration: f64,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub error_message: Option<String>,
}

/// A record as produced by the interceptor, before the store assigns
/// `id` and `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLogRecord {
    pub path: String,
    pub method: String,
    pub request_data: Option<Value>,
    pub response_data: Option<Value>,
    pub status_code: u16,
    pub duration: f64,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub error_message: Option<String>,
}

impl NewLogRecord {
    /// Attach store-assigned identity.
    pub fn into_record(self, id: i64, timestamp: DateTime<Utc>) -> LogRecord {
        LogRecord {
            id,
            timestamp,
            path: self.path,
            method: self.method,
            request_data: self.request_data,
            response_data: self.response_data,
            status_code: self.status_code,
            duration: self.duration.max(0.0),
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            error_message: self.error_message,
        }
    }
}

/// Fields exposed by the log API. Duration and network metadata stay in
/// storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecordView {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub path: String,
    pub method: String,
    pub request_data: Option<Value>,
    pub response_data: Option<Value>,
    pub status_code: u16,
    pub error_message: Option<String>,
}

impl From<&LogRecord> for LogRecordView {
    fn from(record: &LogRecord) -> Self {
        Self {
            id: record.id,
            timestamp: record.timestamp,
            path: record.path.clone(),
            method: record.method.clone(),
            request_data: record.request_data.clone(),
            response_data: record.response_data.clone(),
            status_code: record.status_code,
            error_message: record.error_message.clone(),
        }
    }
}

impl std::fmt::Display for LogRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} - {}", self.method, self.path, self.status_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> NewLogRecord {
        NewLogRecord {
            path: "/order/create/".into(),
            method: "POST".into(),
            request_data: Some(json!({"item": 3})),
            response_data: Some(json!({"status": "OK"})),
            status_code: 201,
            duration: 0.042,
            ip_address: Some("10.0.0.7".into()),
            user_agent: Some("courier-app/2.1".into()),
            error_message: None,
        }
    }

    #[test]
    fn into_record_keeps_fields_and_assigns_identity() {
        let now = Utc::now();
        let record = sample().into_record(7, now);
        assert_eq!(record.id, 7);
        assert_eq!(record.timestamp, now);
        assert_eq!(record.path, "/order/create/");
        assert_eq!(record.status_code, 201);
        assert_eq!(record.ip_address.as_deref(), Some("10.0.0.7"));
    }

    #[test]
    fn into_record_clamps_negative_duration() {
        let mut new = sample();
        new.duration = -0.5;
        assert_eq!(new.into_record(1, Utc::now()).duration, 0.0);
    }

    #[test]
    fn display_shows_method_path_and_status() {
        let record = sample().into_record(1, Utc::now());
        assert_eq!(record.to_string(), "POST /order/create/ - 201");
    }

    #[test]
    fn view_hides_duration_and_network_metadata() {
        let record = sample().into_record(3, Utc::now());
        let v = serde_json::to_value(LogRecordView::from(&record)).unwrap();
        assert_eq!(v["id"], 3);
        assert_eq!(v["method"], "POST");
        assert_eq!(v["request_data"]["item"], 3);
        assert!(v["error_message"].is_null());
        assert!(v.get("duration").is_none());
        assert!(v.get("ip_address").is_none());
        assert!(v.get("user_agent").is_none());
    }
}
