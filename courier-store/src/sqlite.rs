//! SQLite-backed log store.
//!
//! Filtering, search, ordering and paging run in SQL so the process never
//! holds more than one page of rows. Timestamps are stored as fixed-width
//! RFC 3339 text, which keeps lexicographic and chronological order equal.

use crate::LogStore;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use courier_core::error::CourierError;
use courier_core::log_query::{LogPage, LogQuery};
use courier_core::log_record::{LogRecord, NewLogRecord};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::str::FromStr;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS request_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        path TEXT NOT NULL,
        method TEXT NOT NULL,
        request_data TEXT NULL,
        response_data TEXT NULL,
        status_code INTEGER NOT NULL,
        duration REAL NOT NULL,
        ip_address TEXT NULL,
        user_agent TEXT NULL,
        error_message TEXT NULL
    )",
    "CREATE INDEX IF NOT EXISTS request_log_timestamp_idx ON request_log (timestamp DESC)",
];

const COLUMNS: &str = "id, timestamp, path, method, request_data, response_data, \
                       status_code, duration, ip_address, user_agent, error_message";

#[derive(Clone)]
pub struct SqliteLogStore {
    pool: SqlitePool,
}

impl SqliteLogStore {
    /// Connect to `url` (creating the database file if needed) and ensure the
    /// schema exists.
    pub async fn connect(url: &str) -> Result<Self, CourierError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(store_error)?
            .create_if_missing(true);
        // An in-memory database exists per connection, so keep exactly one.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(store_error)?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, CourierError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(store_error)?;
        }
        Ok(Self { pool })
    }
}

#[async_trait]
impl LogStore for SqliteLogStore {
    async fn insert(&self, record: NewLogRecord) -> Result<LogRecord, CourierError> {
        let timestamp = Utc::now();
        let request_data = record.request_data.as_ref().map(serde_json::to_string).transpose()?;
        let response_data = record.response_data.as_ref().map(serde_json::to_string).transpose()?;

        let result = sqlx::query(
            "INSERT INTO request_log (timestamp, path, method, request_data, response_data, \
             status_code, duration, ip_address, user_agent, error_message) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(format_timestamp(&timestamp))
        .bind(&record.path)
        .bind(&record.method)
        .bind(request_data)
        .bind(response_data)
        .bind(i64::from(record.status_code))
        .bind(record.duration.max(0.0))
        .bind(&record.ip_address)
        .bind(&record.user_agent)
        .bind(&record.error_message)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(record.into_record(result.last_insert_rowid(), timestamp))
    }

    async fn get(&self, id: i64) -> Result<Option<LogRecord>, CourierError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM request_log WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        row.as_ref().map(row_to_record).transpose()
    }

    async fn query(&self, query: &LogQuery) -> Result<LogPage, CourierError> {
        let mut counter = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM request_log");
        push_filters(&mut counter, query);
        let count: i64 = counter
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;
        let count = count.max(0) as u64;

        let window = query.resolve_page(count)?;

        let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM request_log"));
        push_filters(&mut select, query);
        select.push(" ORDER BY ");
        for term in &query.ordering {
            select.push(term.field.column());
            select.push(if term.descending { " DESC, " } else { " ASC, " });
        }
        select.push(if query.id_descending() { "id DESC" } else { "id ASC" });
        select.push(" LIMIT ");
        select.push_bind(window.limit as i64);
        select.push(" OFFSET ");
        select.push_bind(window.offset as i64);

        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;
        let records = rows.iter().map(row_to_record).collect::<Result<Vec<_>, _>>()?;
        Ok(LogPage::new(records, count, window))
    }

    async fn count(&self) -> Result<u64, CourierError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM request_log")
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(count.max(0) as u64)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &LogQuery) {
    builder.push(" WHERE 1 = 1");
    if let Some(ref method) = query.method {
        builder.push(" AND method = ");
        builder.push_bind(method.clone());
    }
    if let Some(status) = query.status_code {
        builder.push(" AND status_code = ");
        builder.push_bind(status);
    }
    for term in &query.search_terms {
        let pattern = format!("%{}%", escape_like(term));
        builder.push(" AND (LOWER(path) LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR LOWER(COALESCE(error_message, '')) LIKE ");
        builder.push_bind(pattern);
        builder.push(" ESCAPE '\\')");
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_record(row: &SqliteRow) -> Result<LogRecord, CourierError> {
    let timestamp: String = row.try_get("timestamp").map_err(store_error)?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map_err(|e| CourierError::Store(format!("bad timestamp {timestamp:?}: {e}")))?
        .with_timezone(&Utc);
    let status_code: i64 = row.try_get("status_code").map_err(store_error)?;

    Ok(LogRecord {
        id: row.try_get("id").map_err(store_error)?,
        timestamp,
        path: row.try_get("path").map_err(store_error)?,
        method: row.try_get("method").map_err(store_error)?,
        request_data: decode_json(row.try_get("request_data").map_err(store_error)?)?,
        response_data: decode_json(row.try_get("response_data").map_err(store_error)?)?,
        status_code: u16::try_from(status_code)
            .map_err(|_| CourierError::Store(format!("status code out of range: {status_code}")))?,
        duration: row.try_get("duration").map_err(store_error)?,
        ip_address: row.try_get("ip_address").map_err(store_error)?,
        user_agent: row.try_get("user_agent").map_err(store_error)?,
        error_message: row.try_get("error_message").map_err(store_error)?,
    })
}

fn decode_json(raw: Option<String>) -> Result<Option<serde_json::Value>, CourierError> {
    Ok(raw.map(|s| serde_json::from_str(&s)).transpose()?)
}

fn store_error(e: sqlx::Error) -> CourierError {
    CourierError::Store(e.to_string())
}
