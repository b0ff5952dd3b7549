use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Request log metrics, gated behind `enabled`.
///
/// When `enabled = false` no registry is created and every recording call
/// returns immediately.
pub struct RequestLogMetrics {
    enabled: bool,
    registry: Option<Registry>,
    pub records_total: Option<IntCounterVec>,
    pub write_failures_total: Option<IntCounter>,
    pub dropped_total: Option<IntCounter>,
    pub request_duration: Option<HistogramVec>,
}

impl RequestLogMetrics {
    /// Create a new collector. When `enabled = false`, everything is None.
    pub fn new(enabled: bool) -> anyhow::Result<Self> {
        if !enabled {
            return Ok(Self::disabled());
        }

        let registry = Registry::new();

        let records_total = IntCounterVec::new(
            Opts::new("courier_request_log_records_total", "Log records persisted"),
            &["method", "status"],
        )?;
        let write_failures_total = IntCounter::new(
            "courier_request_log_write_failures_total",
            "Log record inserts that failed",
        )?;
        let dropped_total = IntCounter::new(
            "courier_request_log_dropped_total",
            "Log records dropped because the write queue was full",
        )?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new("courier_request_duration_seconds", "Handler latency seen by the interceptor")
                .buckets(vec![
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ]),
            &["method"],
        )?;

        registry.register(Box::new(records_total.clone()))?;
        registry.register(Box::new(write_failures_total.clone()))?;
        registry.register(Box::new(dropped_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self {
            enabled: true,
            registry: Some(registry),
            records_total: Some(records_total),
            write_failures_total: Some(write_failures_total),
            dropped_total: Some(dropped_total),
            request_duration: Some(request_duration),
        })
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            registry: None,
            records_total: None,
            write_failures_total: None,
            dropped_total: None,
            request_duration: None,
        }
    }

    #[inline]
    pub fn observe_request(&self, method: &str, duration_secs: f64) {
        if let Some(ref hist) = self.request_duration {
            hist.with_label_values(&[method]).observe(duration_secs);
        }
    }

    #[inline]
    pub fn record_stored(&self, method: &str, status: u16) {
        if let Some(ref counter) = self.records_total {
            let mut buf = itoa::Buffer::new();
            counter.with_label_values(&[method, buf.format(status)]).inc();
        }
    }

    #[inline]
    pub fn write_failed(&self) {
        if let Some(ref counter) = self.write_failures_total {
            counter.inc();
        }
    }

    #[inline]
    pub fn dropped(&self) {
        if let Some(ref counter) = self.dropped_total {
            counter.inc();
        }
    }

    /// Render prometheus text exposition format.
    pub fn render(&self) -> String {
        if let Some(ref registry) = self.registry {
            let encoder = TextEncoder::new();
            let metric_families = registry.gather();
            let mut buffer = Vec::new();
            encoder.encode(&metric_families, &mut buffer).unwrap_or(());
            String::from_utf8(buffer).unwrap_or_default()
        } else {
            String::new()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
