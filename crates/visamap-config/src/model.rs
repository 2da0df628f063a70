//! Validated server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use visamap_core::AdminSecret;
use visamap_telemetry::LogFormat;

/// Listener address used when `VISAMAP_BIND_ADDR` is unset.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:7070";
/// Artifact directory used when `VISAMAP_ARTIFACT_DIR` is unset.
pub const DEFAULT_ARTIFACT_DIR: &str = "public";
/// Pool size used when `VISAMAP_DB_MAX_CONNECTIONS` is unset.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Environment variable names.
pub mod env {
    /// `PostgreSQL` connection string.
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Shared admin secret.
    pub const ADMIN_PASSWORD: &str = "ADMIN_PASSWORD";
    /// Listener address.
    pub const BIND_ADDR: &str = "VISAMAP_BIND_ADDR";
    /// Directory receiving published artifacts.
    pub const ARTIFACT_DIR: &str = "VISAMAP_ARTIFACT_DIR";
    /// Connection pool size.
    pub const DB_MAX_CONNECTIONS: &str = "VISAMAP_DB_MAX_CONNECTIONS";
    /// Default log filter.
    pub const LOG_LEVEL: &str = "VISAMAP_LOG_LEVEL";
    /// Log output format.
    pub const LOG_FORMAT: &str = "VISAMAP_LOG_FORMAT";
}

/// Fully validated server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` connection string.
    pub database_url: String,
    /// Shared admin secret guarding mutations and publish.
    pub admin_secret: AdminSecret,
    /// HTTP listener address.
    pub bind_addr: SocketAddr,
    /// Directory receiving `visaPolicy.json` and `visaDuration.json`.
    pub artifact_dir: PathBuf,
    /// Maximum pooled database connections.
    pub db_max_connections: u32,
    /// Default log filter, overridden by `RUST_LOG`.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
}
