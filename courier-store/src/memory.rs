use crate::LogStore;
use crate::journal::{Journal, load_journal};
use async_trait::async_trait;
use chrono::Utc;
use courier_core::error::CourierError;
use courier_core::log_query::{LogPage, LogQuery};
use courier_core::log_record::{LogRecord, NewLogRecord};
use dashmap::DashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::debug;

/// In-memory, append-only log store.
///
/// Inserts from concurrent requests never contend on a single lock: ids come
/// from an atomic counter and rows land in a sharded map. With a journal
/// attached, every record is also appended to disk before it becomes
/// visible.
#[derive(Clone)]
pub struct MemoryLogStore {
    records: Arc<DashMap<i64, LogRecord>>,
    next_id: Arc<AtomicI64>,
    journal: Option<Arc<Journal>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicI64::new(1)),
            journal: None,
        }
    }

    /// Replay `path` and keep appending new records to it.
    pub fn with_journal(path: &Path) -> Result<Self, CourierError> {
        let restored = load_journal(path)?;
        let records = DashMap::with_capacity(restored.len());
        let mut max_id = 0;
        for record in restored {
            max_id = max_id.max(record.id);
            records.insert(record.id, record);
        }
        let journal = Journal::open(path)?;
        Ok(Self {
            records: Arc::new(records),
            next_id: Arc::new(AtomicI64::new(max_id + 1)),
            journal: Some(Arc::new(journal)),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for MemoryLogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn insert(&self, record: NewLogRecord) -> Result<LogRecord, CourierError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let record = record.into_record(id, Utc::now());
        if let Some(ref journal) = self.journal {
            journal.append(&record)?;
        }
        self.records.insert(id, record.clone());
        debug!(id, record = %record, "log record stored");
        Ok(record)
    }

    async fn get(&self, id: i64) -> Result<Option<LogRecord>, CourierError> {
        Ok(self.records.get(&id).map(|r| r.value().clone()))
    }

    async fn query(&self, query: &LogQuery) -> Result<LogPage, CourierError> {
        let mut matching: Vec<LogRecord> = self
            .records
            .iter()
            .filter(|r| query.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();
        matching.sort_by(|a, b| query.compare(a, b));

        let count = matching.len() as u64;
        let window = query.resolve_page(count)?;
        let records = matching
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .collect();
        Ok(LogPage::new(records, count, window))
    }

    async fn count(&self) -> Result<u64, CourierError> {
        Ok(self.records.len() as u64)
    }
}
