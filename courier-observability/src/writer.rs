use crate::metrics::RequestLogMetrics;
use courier_core::config::{RequestLogConfig, WriteMode};
use courier_core::log_record::NewLogRecord;
use courier_store::LogStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Hands finished log records to the store.
///
/// In `Direct` mode the insert is awaited on the request path. In `Queued`
/// mode records go through a bounded channel drained by a background task;
/// when the channel is full the record is dropped and counted. A write
/// failure never reaches the client in either mode.
#[derive(Clone)]
pub struct RecordWriter {
    inner: WriterInner,
    metrics: Arc<RequestLogMetrics>,
}

#[derive(Clone)]
enum WriterInner {
    Direct(Arc<dyn LogStore>),
    Queued(mpsc::Sender<NewLogRecord>),
}

impl RecordWriter {
    pub fn direct(store: Arc<dyn LogStore>, metrics: Arc<RequestLogMetrics>) -> Self {
        Self {
            inner: WriterInner::Direct(store),
            metrics,
        }
    }

    /// Spawn the drain task. The returned handle completes once every clone
    /// of the writer has been dropped and the queue is empty.
    pub fn queued(
        store: Arc<dyn LogStore>,
        capacity: usize,
        metrics: Arc<RequestLogMetrics>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(drain_loop(store, rx, metrics.clone()));
        (
            Self {
                inner: WriterInner::Queued(tx),
                metrics,
            },
            handle,
        )
    }

    pub fn from_config(
        config: &RequestLogConfig,
        store: Arc<dyn LogStore>,
        metrics: Arc<RequestLogMetrics>,
    ) -> (Self, Option<JoinHandle<()>>) {
        match config.write_mode {
            WriteMode::Direct => (Self::direct(store, metrics), None),
            WriteMode::Queued => {
                let (writer, handle) = Self::queued(store, config.queue_capacity, metrics);
                (writer, Some(handle))
            }
        }
    }

    pub async fn submit(&self, record: NewLogRecord) {
        match self.inner {
            WriterInner::Direct(ref store) => persist(store.as_ref(), &self.metrics, record).await,
            WriterInner::Queued(ref tx) => match tx.try_send(record) {
                Ok(()) => {}
                Err(TrySendError::Full(record)) => {
                    warn!(
                        method = %record.method,
                        path = %record.path,
                        "request log queue full, record dropped"
                    );
                    self.metrics.dropped();
                }
                Err(TrySendError::Closed(record)) => {
                    error!(path = %record.path, "request log writer stopped, record dropped");
                    self.metrics.dropped();
                }
            },
        }
    }
}

async fn drain_loop(
    store: Arc<dyn LogStore>,
    mut rx: mpsc::Receiver<NewLogRecord>,
    metrics: Arc<RequestLogMetrics>,
) {
    while let Some(record) = rx.recv().await {
        persist(store.as_ref(), &metrics, record).await;
    }
    debug!("request log writer drained");
}

async fn persist(store: &dyn LogStore, metrics: &RequestLogMetrics, record: NewLogRecord) {
    let method = record.method.clone();
    let status = record.status_code;
    match store.insert(record).await {
        Ok(saved) => {
            debug!(id = saved.id, record = %saved, "request logged");
            metrics.record_stored(&method, status);
        }
        Err(e) => {
            error!(error = %e, method = %method, status, "failed to persist request log");
            metrics.write_failed();
        }
    }
}
