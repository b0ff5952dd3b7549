use crate::handlers;
use crate::middleware::api_key_auth;
use axum::{
    Router,
    extract::State,
    http::header,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use courier_core::config::{CourierConfig, ServerConfig};
use courier_observability::{RequestLogMetrics, RequestLogger, log_requests};
use courier_store::LogStore;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared state for the log API.
pub struct AdminState {
    pub store: Arc<dyn LogStore>,
    pub metrics: Arc<RequestLogMetrics>,
    /// Required `X-API-Key` value for the log endpoints, if any.
    pub api_key: Option<String>,
    pub metrics_path: String,
}

impl AdminState {
    pub fn new(
        config: &CourierConfig,
        store: Arc<dyn LogStore>,
        metrics: Arc<RequestLogMetrics>,
    ) -> Self {
        Self {
            store,
            metrics,
            api_key: config.admin.api_key.clone().filter(|k| !k.is_empty()),
            metrics_path: normalize_path(&config.observability.prometheus.path),
        }
    }
}

/// Build the axum router with the log, health and metrics routes.
pub fn build_admin_router(state: Arc<AdminState>) -> Router {
    let logs = Router::new()
        .route("/logger/logs/", get(handlers::logs::list_logs))
        .route("/logger/logs/{id}/", get(handlers::logs::get_log))
        .route_layer(middleware::from_fn_with_state(state.clone(), api_key_auth));

    let mut app = Router::new()
        .merge(logs)
        .route("/health-check/", get(handlers::health::health_check));
    if state.metrics.is_enabled() {
        app = app.route(&state.metrics_path, get(metrics_handler));
    }

    app.fallback(handlers::health::not_found).with_state(state)
}

/// Wrap the API router with the request interceptor and, optionally, a
/// permissive CORS layer. Business routes are merged in by the caller.
pub fn build_app(router: Router, logger: Option<Arc<RequestLogger>>, cors_allow_any: bool) -> Router {
    let mut app = router;
    if let Some(logger) = logger {
        app = app.layer(middleware::from_fn_with_state(logger, log_requests));
    }
    if cors_allow_any {
        app = app.layer(CorsLayer::permissive());
    }
    app
}

/// Bind `config.addr` and serve until `shutdown` resolves.
pub async fn serve(
    config: &ServerConfig,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    info!(addr = %listener.local_addr()?, "Courier API listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Prometheus metrics endpoint handler.
async fn metrics_handler(State(state): State<Arc<AdminState>>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
        .into_response()
}
