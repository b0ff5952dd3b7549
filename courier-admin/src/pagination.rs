//! `next` / `previous` links for paginated listings.

use courier_core::log_query::LogPage;
use http::{HeaderMap, Uri};
use http::header::HOST;
use serde_json::{Value, json};

const PAGE_PARAM: &str = "page";

/// Pagination metadata for the `options` field: `{count, next, previous}`.
pub fn pagination_options(uri: &Uri, headers: &HeaderMap, page: &LogPage) -> Value {
    let base = base_url(uri, headers);
    let query = uri.query();

    let next = page
        .has_next()
        .then(|| link_to(&base, query, Some(page.number + 1)));
    let previous = page.has_previous().then(|| {
        let target = page.number - 1;
        // The first page is addressed without a page parameter.
        link_to(&base, query, (target > 1).then_some(target))
    });

    json!({
        "count": page.count,
        "next": next,
        "previous": previous,
    })
}

/// `scheme://host/path` when the request carried a Host header, else the bare
/// path.
fn base_url(uri: &Uri, headers: &HeaderMap) -> String {
    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .or_else(|| uri.authority().map(|a| a.as_str()));
    match host {
        Some(host) => {
            let scheme = headers
                .get("x-forwarded-proto")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .or_else(|| uri.scheme_str())
                .unwrap_or("http");
            format!("{scheme}://{host}{}", uri.path())
        }
        None => uri.path().to_string(),
    }
}

/// Rebuild the query string with `page` replaced (or removed for `None`),
/// keeping every other parameter in its original order.
fn link_to(base: &str, query: Option<&str>, page: Option<u64>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if let Some(query) = query {
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if key != PAGE_PARAM {
                serializer.append_pair(&key, &value);
            }
        }
    }
    if let Some(page) = page {
        serializer.append_pair(PAGE_PARAM, &page.to_string());
    }
    let query = serializer.finish();
    if query.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{query}")
    }
}
