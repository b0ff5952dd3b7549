pub mod journal;
pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

use async_trait::async_trait;
use courier_core::error::CourierError;
use courier_core::log_query::{LogPage, LogQuery};
use courier_core::log_record::{LogRecord, NewLogRecord};

pub use memory::MemoryLogStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteLogStore;

/// Append-only storage for request log records.
///
/// Writers only ever call [`LogStore::insert`]; readers use the rest. There
/// is no update or delete: retention is handled outside the service.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Persist a new record, assigning its `id` and `timestamp`.
    async fn insert(&self, record: NewLogRecord) -> Result<LogRecord, CourierError>;

    async fn get(&self, id: i64) -> Result<Option<LogRecord>, CourierError>;

    /// Filtered, ordered, paginated listing.
    async fn query(&self, query: &LogQuery) -> Result<LogPage, CourierError>;

    async fn count(&self) -> Result<u64, CourierError>;
}
