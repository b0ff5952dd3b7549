use serde_json::Value;

/// A request or response body as it will be persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum CapturedBody {
    /// Parsed JSON document.
    Json(Value),
    /// Not JSON, but valid UTF-8.
    Text(String),
    /// Empty, oversized, or undecodable.
    Absent,
}

impl CapturedBody {
    /// Decode `bytes` for persistence. Never fails: anything that cannot be
    /// represented degrades to [`CapturedBody::Absent`].
    pub fn capture(bytes: &[u8], limit: usize) -> Self {
        if bytes.is_empty() {
            return CapturedBody::Absent;
        }
        if bytes.len() > limit {
            tracing::debug!(size = bytes.len(), limit, "body exceeds capture limit, not persisted");
            return CapturedBody::Absent;
        }
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => CapturedBody::Json(value),
            Err(_) => match std::str::from_utf8(bytes) {
                Ok(text) => CapturedBody::Text(text.to_owned()),
                Err(_) => CapturedBody::Absent,
            },
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            CapturedBody::Json(value) => Some(value),
            CapturedBody::Text(text) => Some(Value::String(text)),
            CapturedBody::Absent => None,
        }
    }
}
