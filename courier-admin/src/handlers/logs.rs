use crate::pagination::pagination_options;
use crate::response::ApiResult;
use crate::server::AdminState;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use courier_core::envelope::Envelope;
use courier_core::error::CourierError;
use courier_core::log_query::{LogQuery, LogQueryParams};
use courier_core::log_record::LogRecordView;
use courier_observability::envelope_response;
use http::{HeaderMap, StatusCode, Uri};
use serde_json::json;
use std::sync::Arc;

/// `GET /logger/logs/`: filtered, searched, ordered, paginated listing.
pub async fn list_logs(
    State(state): State<Arc<AdminState>>,
    uri: Uri,
    headers: HeaderMap,
    params: Result<Query<LogQueryParams>, QueryRejection>,
) -> ApiResult {
    let Query(params) = params.map_err(|e| CourierError::InvalidQuery(e.body_text()))?;
    let query = LogQuery::from_params(&params)?;
    let page = state.store.query(&query).await?;

    let options = pagination_options(&uri, &headers, &page);
    let views: Vec<LogRecordView> = page.records.iter().map(LogRecordView::from).collect();
    Ok(envelope_response(Envelope::success(
        StatusCode::OK,
        json!(views),
        options,
    )))
}

/// `GET /logger/logs/{id}/`.
pub async fn get_log(State(state): State<Arc<AdminState>>, Path(id): Path<String>) -> ApiResult {
    let id: i64 = id.parse().map_err(|_| CourierError::LogNotFound)?;
    let record = state.store.get(id).await?.ok_or(CourierError::LogNotFound)?;
    Ok(envelope_response(Envelope::success(
        StatusCode::OK,
        json!(LogRecordView::from(&record)),
        json!({}),
    )))
}
