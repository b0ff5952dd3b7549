use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourierConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub request_log: RequestLogConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Answer CORS preflights for any origin.
    #[serde(default)]
    pub cors_allow_any: bool,
}

/// Log viewer API settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    /// When set, `/logger/` endpoints require a matching `X-API-Key` header.
    pub api_key: Option<String>,
}

/// Request logging interceptor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLogConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Bodies larger than this are forwarded untouched but persisted as `null`.
    #[serde(default = "default_capture_limit")]
    pub capture_limit_bytes: usize,
    /// Prefer the first `X-Forwarded-For` entry over the peer address.
    #[serde(default)]
    pub trust_forwarded_for: bool,
    #[serde(default = "default_write_mode")]
    pub write_mode: WriteMode,
    /// Bounded queue size for `write_mode: queued`.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

/// How the interceptor hands finished records to the store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Await the insert before returning the response.
    Direct,
    /// Push onto a bounded channel drained by a background task.
    Queued,
}

/// Log record storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    /// Append-only JSON-lines journal for the memory backend.
    #[serde(default)]
    pub journal_path: Option<PathBuf>,
    #[serde(default = "default_sqlite_url")]
    pub sqlite_url: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Sqlite,
}

/// Observability settings, disabled by default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrometheusConfig {
    /// When false, no prometheus counters are updated on the hot path.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_addr() -> String { "0.0.0.0:8000".into() }
fn default_true() -> bool { true }
fn default_capture_limit() -> usize { 1024 * 1024 }
fn default_write_mode() -> WriteMode { WriteMode::Queued }
fn default_queue_capacity() -> usize { 10_000 }
fn default_backend() -> StorageBackend { StorageBackend::Memory }
fn default_sqlite_url() -> String { "sqlite://data/courier.db".into() }
fn default_metrics_path() -> String { "/metrics".into() }

// ── Impls ─────────────────────────────────────────────────────

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            cors_allow_any: false,
        }
    }
}

impl Default for RequestLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capture_limit_bytes: default_capture_limit(),
            trust_forwarded_for: false,
            write_mode: default_write_mode(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            journal_path: None,
            sqlite_url: default_sqlite_url(),
        }
    }
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_metrics_path(),
        }
    }
}

impl CourierConfig {
    /// Load configuration from YAML file + env overrides.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: CourierConfig = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("COURIER_").split("__"))
            .extract()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_server_config_has_expected_values() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.addr, "0.0.0.0:8000");
        assert!(!cfg.cors_allow_any);
    }

    #[test]
    fn default_request_log_config_is_enabled_and_queued() {
        let cfg = RequestLogConfig::default();
        assert!(cfg.enabled);
        assert_eq!(cfg.capture_limit_bytes, 1024 * 1024);
        assert_eq!(cfg.write_mode, WriteMode::Queued);
        assert_eq!(cfg.queue_capacity, 10_000);
        assert!(!cfg.trust_forwarded_for);
    }

    #[test]
    fn default_storage_is_memory_without_journal() {
        let cfg = StorageConfig::default();
        assert_eq!(cfg.backend, StorageBackend::Memory);
        assert!(cfg.journal_path.is_none());
    }

    #[test]
    fn default_prometheus_is_disabled() {
        let cfg = ObservabilityConfig::default();
        assert!(!cfg.prometheus.enabled);
        assert_eq!(cfg.prometheus.path, "/metrics");
    }

    #[test]
    fn write_mode_serializes_to_lowercase() {
        assert_eq!(serde_json::to_string(&WriteMode::Direct).unwrap(), "\"direct\"");
        assert_eq!(serde_json::to_string(&WriteMode::Queued).unwrap(), "\"queued\"");
    }

    #[test]
    fn load_from_valid_yaml_overrides_defaults() {
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(
            tmpfile,
            "server:\n  addr: \"127.0.0.1:9999\"\nrequest_log:\n  write_mode: direct\n  capture_limit_bytes: 512\n"
        )
        .unwrap();
        let cfg = CourierConfig::load(tmpfile.path()).unwrap();
        assert_eq!(cfg.server.addr, "127.0.0.1:9999");
        assert_eq!(cfg.request_log.write_mode, WriteMode::Direct);
        assert_eq!(cfg.request_log.capture_limit_bytes, 512);
        // Defaults still apply for unspecified fields
        assert!(cfg.request_log.enabled);
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn load_yaml_with_storage_and_admin() {
        let yaml = r#"
admin:
  api_key: "ops-secret"
storage:
  backend: sqlite
  sqlite_url: "sqlite::memory:"
observability:
  prometheus:
    enabled: true
"#;
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(tmpfile, "{yaml}").unwrap();
        let cfg = CourierConfig::load(tmpfile.path()).unwrap();
        assert_eq!(cfg.admin.api_key.as_deref(), Some("ops-secret"));
        assert_eq!(cfg.storage.backend, StorageBackend::Sqlite);
        assert_eq!(cfg.storage.sqlite_url, "sqlite::memory:");
        assert!(cfg.observability.prometheus.enabled);
    }

    #[test]
    fn load_rejects_unknown_write_mode() {
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(tmpfile, "request_log:\n  write_mode: sometimes\n").unwrap();
        assert!(CourierConfig::load(tmpfile.path()).is_err());
    }
}
