use crate::body::CapturedBody;
use crate::exclusion::PathExclusions;
use crate::masking::mask_secrets;
use crate::metrics::RequestLogMetrics;
use crate::response::envelope_response;
use crate::writer::RecordWriter;
use axum::body::{Body, HttpBody, to_bytes};
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use courier_core::config::RequestLogConfig;
use courier_core::envelope::Envelope;
use courier_core::log_record::NewLogRecord;
use http::header::{CONTENT_LENGTH, USER_AGENT};
use http::{HeaderMap, StatusCode};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Response extension carrying a failure message for the log record.
///
/// Handlers (or the envelope renderer) attach it to a response; the
/// interceptor copies it into `error_message`.
#[derive(Debug, Clone)]
pub struct ErrorMessage(pub String);

/// Shared state for [`log_requests`].
pub struct RequestLogger {
    writer: RecordWriter,
    metrics: Arc<RequestLogMetrics>,
    capture_limit: usize,
    trust_forwarded_for: bool,
    exclusions: PathExclusions,
}

impl RequestLogger {
    pub fn new(config: &RequestLogConfig, writer: RecordWriter, metrics: Arc<RequestLogMetrics>) -> Self {
        Self {
            writer,
            metrics,
            capture_limit: config.capture_limit_bytes,
            trust_forwarded_for: config.trust_forwarded_for,
            exclusions: PathExclusions::default(),
        }
    }

    /// Skip logging for `prefix` in addition to the built-in exclusions.
    pub fn exclude_path(mut self, prefix: &str) -> Self {
        self.exclusions = self.exclusions.with(prefix);
        self
    }

    /// Buffer `body` when its size is known and fits the capture limit.
    ///
    /// Anything else (a stream, a long-poll, an oversized upload) is handed
    /// back untouched with nothing captured. `Err` means a capturable body
    /// failed mid-read.
    async fn capture(&self, body: Body) -> Result<(CapturedBody, Body), axum::Error> {
        let fits = body
            .size_hint()
            .upper()
            .is_some_and(|upper| upper <= self.capture_limit as u64);
        if !fits {
            return Ok((CapturedBody::Absent, body));
        }
        let bytes = to_bytes(body, self.capture_limit).await?;
        Ok((CapturedBody::capture(&bytes, self.capture_limit), Body::from(bytes)))
    }

    fn client_ip(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
        if self.trust_forwarded_for {
            let forwarded = headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty());
            if let Some(ip) = forwarded {
                return Some(ip.to_string());
            }
        }
        peer.map(|addr| addr.ip().to_string())
    }
}

/// Middleware that records every non-excluded request/response pair.
///
/// Bodies of known size up to `capture_limit_bytes` are buffered so they can
/// be persisted and still reach their consumer unchanged. Larger or unsized
/// bodies stream through and are stored as null. Logging never alters what
/// the client receives.
pub async fn log_requests(
    State(logger): State<Arc<RequestLogger>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if !logger.exclusions.should_log(&path) {
        return next.run(request).await;
    }

    let started = Instant::now();
    let method = request.method().as_str().to_string();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip_address = logger.client_ip(request.headers(), peer);
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let (parts, body) = request.into_parts();
    let (request_body, body) = match logger.capture(body).await {
        Ok(captured) => captured,
        Err(e) => {
            warn!(error = %e, method = %method, path = %path, "failed to read request body");
            return envelope_response(Envelope::failure(
                StatusCode::BAD_REQUEST,
                "Failed to read request body.",
            ));
        }
    };
    let (request_body, masked) = mask_secrets(request_body);
    let request = Request::from_parts(parts, body);

    let response = next.run(request).await;
    let duration = started.elapsed().as_secs_f64();

    let status = response.status();
    let error_message = response
        .extensions()
        .get::<ErrorMessage>()
        .map(|ErrorMessage(message)| message.clone());

    let (mut parts, body) = response.into_parts();
    let (response_body, body) = match logger.capture(body).await {
        Ok(captured) => captured,
        Err(e) => {
            warn!(error = %e, method = %method, path = %path, "failed to read response body");
            parts.headers.remove(CONTENT_LENGTH);
            (CapturedBody::Absent, Body::empty())
        }
    };
    let response = Response::from_parts(parts, body);

    logger.metrics.observe_request(&method, duration);
    debug!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = duration * 1000.0,
        masked,
        "request intercepted"
    );

    logger
        .writer
        .submit(NewLogRecord {
            path,
            method,
            request_data: request_body.into_value(),
            response_data: response_body.into_value(),
            status_code: status.as_u16(),
            duration,
            ip_address,
            user_agent,
            error_message,
        })
        .await;

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::RecordWriter;
    use courier_store::MemoryLogStore;

    fn logger(trust_forwarded_for: bool) -> RequestLogger {
        let config = RequestLogConfig {
            trust_forwarded_for,
            ..Default::default()
        };
        let metrics = Arc::new(RequestLogMetrics::disabled());
        let writer = RecordWriter::direct(Arc::new(MemoryLogStore::new()), metrics.clone());
        RequestLogger::new(&config, writer, metrics)
    }

    fn peer() -> Option<SocketAddr> {
        Some("192.168.1.20:55000".parse().unwrap())
    }

    #[test]
    fn client_ip_uses_peer_address() {
        let headers = HeaderMap::new();
        assert_eq!(logger(false).client_ip(&headers, peer()).as_deref(), Some("192.168.1.20"));
        assert_eq!(logger(false).client_ip(&headers, None), None);
    }

    #[test]
    fn forwarded_for_ignored_unless_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        assert_eq!(logger(false).client_ip(&headers, peer()).as_deref(), Some("192.168.1.20"));
        assert_eq!(logger(true).client_ip(&headers, peer()).as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn empty_forwarded_for_falls_back_to_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", " ".parse().unwrap());
        assert_eq!(logger(true).client_ip(&headers, peer()).as_deref(), Some("192.168.1.20"));
    }
}
