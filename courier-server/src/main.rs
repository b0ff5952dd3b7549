// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Courier: request log service
//
//  HTTP:     axum on the tokio multi-threaded runtime
//  Logging:  interceptor middleware → writer → log store
//  Config:   YAML + COURIER_* env overrides
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use clap::Parser;
use courier_admin::server::{AdminState, build_admin_router, build_app, serve};
use courier_core::config::{CourierConfig, StorageBackend, StorageConfig};
use courier_observability::{RecordWriter, RequestLogMetrics, RequestLogger};
use courier_store::{LogStore, MemoryLogStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// How long shutdown waits for queued log records to be written.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "courier-server", version, about = "Courier: request log service")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/courier/courier.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Tracing ──
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Courier starting");

    // ── Config ──
    let config = if cli.config.exists() {
        info!(path = %cli.config.display(), "Loading config file");
        CourierConfig::load(&cli.config)?
    } else {
        info!("No config file found, using defaults");
        CourierConfig::default()
    };

    // ── Store & metrics ──
    let store = open_store(&config.storage).await?;
    let metrics = Arc::new(RequestLogMetrics::new(config.observability.prometheus.enabled)?);
    info!(
        backend = ?config.storage.backend,
        records = store.count().await?,
        prometheus = metrics.is_enabled(),
        "Log store ready"
    );

    // ── Interceptor ──
    let (logger, drain) = if config.request_log.enabled {
        let (writer, drain) =
            RecordWriter::from_config(&config.request_log, store.clone(), metrics.clone());
        let mut logger = RequestLogger::new(&config.request_log, writer, metrics.clone());
        if metrics.is_enabled() {
            logger = logger.exclude_path(&config.observability.prometheus.path);
        }
        info!(mode = ?config.request_log.write_mode, "Request logging enabled");
        (Some(Arc::new(logger)), drain)
    } else {
        info!("Request logging disabled");
        (None, None)
    };

    // ── Router ──
    let state = Arc::new(AdminState::new(&config, store, metrics));
    let app = build_app(build_admin_router(state), logger, config.server.cors_allow_any);

    // `app` (and with it every writer handle) is dropped when serving stops.
    serve(&config.server, app, shutdown_signal()).await?;

    if let Some(drain) = drain {
        match tokio::time::timeout(DRAIN_TIMEOUT, drain).await {
            Ok(Ok(())) => info!("Request log queue drained"),
            Ok(Err(e)) => warn!(error = %e, "Request log writer task failed"),
            Err(_) => warn!(
                timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "Request log queue not drained before timeout, remaining records lost"
            ),
        }
    }

    info!("Courier stopped");
    Ok(())
}

async fn open_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn LogStore>> {
    match config.backend {
        StorageBackend::Memory => match config.journal_path {
            Some(ref path) => {
                let store = MemoryLogStore::with_journal(path)?;
                info!(path = %path.display(), records = store.len(), "Journal replayed");
                Ok(Arc::new(store))
            }
            None => Ok(Arc::new(MemoryLogStore::new())),
        },
        StorageBackend::Sqlite => open_sqlite(&config.sqlite_url).await,
    }
}

#[cfg(feature = "sqlite")]
async fn open_sqlite(url: &str) -> anyhow::Result<Arc<dyn LogStore>> {
    let store = courier_store::SqliteLogStore::connect(url).await?;
    info!(url, "SQLite log store connected");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "sqlite"))]
async fn open_sqlite(_url: &str) -> anyhow::Result<Arc<dyn LogStore>> {
    anyhow::bail!("storage.backend = sqlite requires building with the `sqlite` feature")
}

/// Resolves on SIGINT (Ctrl+C) or SIGTERM (docker stop).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping...");
}
