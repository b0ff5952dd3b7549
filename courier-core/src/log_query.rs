//! Filtering, search, ordering and pagination over log records.
//!
//! Parsing is lenient where the log API has always been lenient (unknown
//! ordering fields, bad page sizes) and strict where a silent fallback would
//! return the wrong rows (non-numeric status filter, bad page number).

use crate::error::CourierError;
use crate::log_record::LogRecord;
use serde::Deserialize;
use std::cmp::Ordering;

pub const DEFAULT_PAGE_SIZE: u64 = 100;
pub const MAX_PAGE_SIZE: u64 = 1000;

/// Raw query-string parameters of the list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogQueryParams {
    pub method: Option<String>,
    pub status_code: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    Timestamp,
    Duration,
    StatusCode,
}

impl OrderField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "timestamp" => Some(OrderField::Timestamp),
            "duration" => Some(OrderField::Duration),
            "status_code" => Some(OrderField::StatusCode),
            _ => None,
        }
    }

    /// Column name in SQL-backed stores.
    pub fn column(&self) -> &'static str {
        match self {
            OrderField::Timestamp => "timestamp",
            OrderField::Duration => "duration",
            OrderField::StatusCode => "status_code",
        }
    }

    fn compare(&self, a: &LogRecord, b: &LogRecord) -> Ordering {
        match self {
            OrderField::Timestamp => a.timestamp.cmp(&b.timestamp),
            OrderField::Duration => a.duration.total_cmp(&b.duration),
            OrderField::StatusCode => a.status_code.cmp(&b.status_code),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTerm {
    pub field: OrderField,
    pub descending: bool,
}

impl OrderTerm {
    pub const NEWEST_FIRST: OrderTerm = OrderTerm {
        field: OrderField::Timestamp,
        descending: true,
    };

    fn parse(term: &str) -> Option<Self> {
        let term = term.trim();
        let (name, descending) = match term.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (term, false),
        };
        OrderField::parse(name).map(|field| OrderTerm { field, descending })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    Number(u64),
    Last,
}

/// A validated list query.
#[derive(Debug, Clone, PartialEq)]
pub struct LogQuery {
    pub method: Option<String>,
    pub status_code: Option<i64>,
    /// Search terms with ASCII letters lower-cased; every one must match.
    /// Non-ASCII letters compare exactly, as SQLite's `LOWER()` does.
    pub search_terms: Vec<String>,
    /// Never empty.
    pub ordering: Vec<OrderTerm>,
    pub page: PageRequest,
    pub page_size: u64,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            method: None,
            status_code: None,
            search_terms: Vec::new(),
            ordering: vec![OrderTerm::NEWEST_FIRST],
            page: PageRequest::Number(1),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl LogQuery {
    pub fn from_params(params: &LogQueryParams) -> Result<Self, CourierError> {
        let status_code = match non_empty(&params.status_code) {
            Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
                CourierError::InvalidQuery("status_code: Enter a number.".to_string())
            })?),
            None => None,
        };

        let page = match non_empty(&params.page) {
            None => PageRequest::Number(1),
            Some("last") => PageRequest::Last,
            Some(raw) => match raw.parse::<u64>() {
                Ok(n) if n >= 1 => PageRequest::Number(n),
                _ => return Err(CourierError::InvalidPage),
            },
        };

        Ok(Self {
            method: non_empty(&params.method).map(str::to_string),
            status_code,
            search_terms: non_empty(&params.search)
                .map(search_terms)
                .unwrap_or_default(),
            ordering: non_empty(&params.ordering)
                .map(parse_ordering)
                .unwrap_or_else(|| vec![OrderTerm::NEWEST_FIRST]),
            page,
            page_size: non_empty(&params.page_size)
                .map(parse_page_size)
                .unwrap_or(DEFAULT_PAGE_SIZE),
        })
    }

    /// Exact-match filters and search, combined conjunctively.
    pub fn matches(&self, record: &LogRecord) -> bool {
        if let Some(ref method) = self.method {
            if record.method != *method {
                return false;
            }
        }
        if let Some(status) = self.status_code {
            if i64::from(record.status_code) != status {
                return false;
            }
        }
        self.search_terms.iter().all(|term| {
            contains_ci(&record.path, term)
                || record
                    .error_message
                    .as_deref()
                    .is_some_and(|msg| contains_ci(msg, term))
        })
    }

    /// Total order used for listing: the ordering terms, then `id` in the
    /// direction of the first term.
    pub fn compare(&self, a: &LogRecord, b: &LogRecord) -> Ordering {
        for term in &self.ordering {
            let ord = term.field.compare(a, b);
            let ord = if term.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        let ord = a.id.cmp(&b.id);
        if self.id_descending() { ord.reverse() } else { ord }
    }

    /// Direction of the `id` tie-breaker.
    pub fn id_descending(&self) -> bool {
        self.ordering.first().is_none_or(|t| t.descending)
    }

    /// Resolve the requested page against a total match count.
    pub fn resolve_page(&self, count: u64) -> Result<PageWindow, CourierError> {
        let page_size = self.page_size.max(1);
        let num_pages = count.div_ceil(page_size).max(1);
        let number = match self.page {
            PageRequest::Last => num_pages,
            PageRequest::Number(n) if n >= 1 && n <= num_pages => n,
            PageRequest::Number(_) => return Err(CourierError::InvalidPage),
        };
        Ok(PageWindow {
            number,
            num_pages,
            offset: (number - 1) * page_size,
            limit: page_size,
        })
    }
}

/// Position of one page inside a filtered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub offset: u64,
    pub limit: u64,
}

/// One page of matching records plus pagination facts.
#[derive(Debug, Clone)]
pub struct LogPage {
    pub records: Vec<LogRecord>,
    /// Total matching records across all pages.
    pub count: u64,
    pub number: u64,
    pub num_pages: u64,
}

impl LogPage {
    pub fn new(records: Vec<LogRecord>, count: u64, window: PageWindow) -> Self {
        Self {
            records,
            count,
            number: window.number,
            num_pages: window.num_pages,
        }
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn search_terms(raw: &str) -> Vec<String> {
    raw.replace('\0', "")
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

fn parse_ordering(raw: &str) -> Vec<OrderTerm> {
    let terms: Vec<OrderTerm> = raw.split(',').filter_map(OrderTerm::parse).collect();
    if terms.is_empty() {
        tracing::debug!(ordering = raw, "no valid ordering terms, using default");
        vec![OrderTerm::NEWEST_FIRST]
    } else {
        terms
    }
}

fn parse_page_size(raw: &str) -> u64 {
    match raw.parse::<i64>() {
        Ok(n) if n > 0 => (n as u64).min(MAX_PAGE_SIZE),
        _ => DEFAULT_PAGE_SIZE,
    }
}

fn contains_ci(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_ascii_lowercase().contains(lowered_needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn params(pairs: &[(&str, &str)]) -> LogQueryParams {
        let mut p = LogQueryParams::default();
        for (k, v) in pairs {
            let v = Some(v.to_string());
            match *k {
                "method" => p.method = v,
                "status_code" => p.status_code = v,
                "search" => p.search = v,
                "ordering" => p.ordering = v,
                "page" => p.page = v,
                "page_size" => p.page_size = v,
                other => panic!("unknown param {other}"),
            }
        }
        p
    }

    fn record(id: i64, path: &str, status: u16, duration: f64) -> LogRecord {
        LogRecord {
            id,
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap() + Duration::seconds(id),
            path: path.to_string(),
            method: "GET".into(),
            request_data: None,
            response_data: None,
            status_code: status,
            duration,
            ip_address: None,
            user_agent: None,
            error_message: None,
        }
    }

    // ── Parsing ──────────────────────────────────────────────────

    #[test]
    fn empty_params_give_defaults() {
        let q = LogQuery::from_params(&LogQueryParams::default()).unwrap();
        assert_eq!(q, LogQuery::default());
        assert_eq!(q.ordering, vec![OrderTerm::NEWEST_FIRST]);
        assert_eq!(q.page_size, 100);
    }

    #[test]
    fn blank_values_are_ignored() {
        let q = LogQuery::from_params(&params(&[("method", ""), ("status_code", " ")])).unwrap();
        assert!(q.method.is_none());
        assert!(q.status_code.is_none());
    }

    #[test]
    fn non_numeric_status_code_is_rejected() {
        let err = LogQuery::from_params(&params(&[("status_code", "abc")])).unwrap_err();
        assert_eq!(err.to_string(), "status_code: Enter a number.");
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn page_size_is_capped_at_maximum() {
        let q = LogQuery::from_params(&params(&[("page_size", "5000")])).unwrap();
        assert_eq!(q.page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn invalid_page_size_falls_back_to_default() {
        for raw in ["0", "-3", "lots"] {
            let q = LogQuery::from_params(&params(&[("page_size", raw)])).unwrap();
            assert_eq!(q.page_size, DEFAULT_PAGE_SIZE, "page_size={raw}");
        }
    }

    #[test]
    fn page_accepts_numbers_and_last() {
        let q = LogQuery::from_params(&params(&[("page", "3")])).unwrap();
        assert_eq!(q.page, PageRequest::Number(3));
        let q = LogQuery::from_params(&params(&[("page", "last")])).unwrap();
        assert_eq!(q.page, PageRequest::Last);
    }

    #[test]
    fn page_zero_or_garbage_is_invalid() {
        for raw in ["0", "first", "-1"] {
            let err = LogQuery::from_params(&params(&[("page", raw)])).unwrap_err();
            assert!(matches!(err, CourierError::InvalidPage), "page={raw}");
        }
    }

    #[test]
    fn ordering_parses_multiple_terms_and_skips_unknown() {
        let q = LogQuery::from_params(&params(&[("ordering", "status_code,-bogus,-duration")])).unwrap();
        assert_eq!(
            q.ordering,
            vec![
                OrderTerm { field: OrderField::StatusCode, descending: false },
                OrderTerm { field: OrderField::Duration, descending: true },
            ]
        );
    }

    #[test]
    fn ordering_with_only_unknown_fields_uses_default() {
        let q = LogQuery::from_params(&params(&[("ordering", "path,-ip_address")])).unwrap();
        assert_eq!(q.ordering, vec![OrderTerm::NEWEST_FIRST]);
    }

    #[test]
    fn search_splits_on_whitespace_and_commas() {
        let q = LogQuery::from_params(&params(&[("search", "Order, create  login")])).unwrap();
        assert_eq!(q.search_terms, vec!["order", "create", "login"]);
    }

    // ── Matching ─────────────────────────────────────────────────

    #[test]
    fn filters_combine_conjunctively() {
        let q = LogQuery::from_params(&params(&[("method", "GET"), ("status_code", "404")])).unwrap();
        assert!(q.matches(&record(1, "/a", 404, 0.1)));
        assert!(!q.matches(&record(2, "/a", 200, 0.1)));
        let mut post = record(3, "/a", 404, 0.1);
        post.method = "POST".into();
        assert!(!q.matches(&post));
    }

    #[test]
    fn method_filter_is_exact() {
        let q = LogQuery::from_params(&params(&[("method", "get")])).unwrap();
        assert!(!q.matches(&record(1, "/a", 200, 0.1)));
    }

    #[test]
    fn search_matches_path_or_error_message_case_insensitively() {
        let q = LogQuery::from_params(&params(&[("search", "TIMEOUT")])).unwrap();
        let mut with_error = record(1, "/order/", 504, 1.0);
        with_error.error_message = Some("Upstream timeout".into());
        assert!(q.matches(&with_error));
        assert!(q.matches(&record(2, "/debug/timeout/", 200, 0.1)));
        assert!(!q.matches(&record(3, "/order/", 200, 0.1)));
    }

    #[test]
    fn search_folds_ascii_case_only() {
        let q = LogQuery::from_params(&params(&[("search", "CAFÉ")])).unwrap();
        assert_eq!(q.search_terms, vec!["cafÉ"]);
        assert!(q.matches(&record(1, "/menu/cafÉ/", 200, 0.1)));
        assert!(!q.matches(&record(2, "/menu/café/", 200, 0.1)));
    }

    #[test]
    fn every_search_term_must_match() {
        let q = LogQuery::from_params(&params(&[("search", "order invoice")])).unwrap();
        assert!(!q.matches(&record(1, "/order/list/", 200, 0.1)));
        assert!(q.matches(&record(2, "/order/7/invoice/", 200, 0.1)));
    }

    // ── Ordering ─────────────────────────────────────────────────

    #[test]
    fn default_ordering_is_newest_first() {
        let q = LogQuery::default();
        let mut records = vec![record(1, "/a", 200, 0.1), record(3, "/c", 200, 0.1), record(2, "/b", 200, 0.1)];
        records.sort_by(|a, b| q.compare(a, b));
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn ties_are_broken_by_id_in_first_term_direction() {
        let q = LogQuery::from_params(&params(&[("ordering", "status_code")])).unwrap();
        let mut records = vec![record(2, "/a", 200, 0.1), record(1, "/b", 200, 0.1), record(3, "/c", 100, 0.1)];
        records.sort_by(|a, b| q.compare(a, b));
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn duration_descending_ordering() {
        let q = LogQuery::from_params(&params(&[("ordering", "-duration")])).unwrap();
        let mut records = vec![record(1, "/a", 200, 0.5), record(2, "/b", 200, 2.0), record(3, "/c", 200, 0.01)];
        records.sort_by(|a, b| q.compare(a, b));
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    // ── Pagination ───────────────────────────────────────────────

    #[test]
    fn empty_result_still_has_first_page() {
        let w = LogQuery::default().resolve_page(0).unwrap();
        assert_eq!(w.number, 1);
        assert_eq!(w.num_pages, 1);
        assert_eq!(w.offset, 0);
    }

    #[test]
    fn page_beyond_last_is_invalid() {
        let q = LogQuery::from_params(&params(&[("page", "4"), ("page_size", "10")])).unwrap();
        assert!(matches!(q.resolve_page(30), Err(CourierError::InvalidPage)));
        assert_eq!(q.resolve_page(31).unwrap().number, 4);
    }

    #[test]
    fn last_page_resolves_to_final_window() {
        let q = LogQuery::from_params(&params(&[("page", "last"), ("page_size", "10")])).unwrap();
        let w = q.resolve_page(25).unwrap();
        assert_eq!(w.number, 3);
        assert_eq!(w.offset, 20);
        assert_eq!(w.limit, 10);
    }

    #[test]
    fn page_flags_reflect_position() {
        let window = PageWindow { number: 2, num_pages: 3, offset: 10, limit: 10 };
        let page = LogPage::new(vec![], 25, window);
        assert!(page.has_next());
        assert!(page.has_previous());
        let last = LogPage::new(vec![], 25, PageWindow { number: 3, ..window });
        assert!(!last.has_next());
    }
}
