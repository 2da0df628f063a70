//! Environment lookup and validation.

use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use visamap_core::AdminSecret;
use visamap_telemetry::{DEFAULT_LOG_LEVEL, LogFormat};

use crate::error::{ConfigError, ConfigResult};
use crate::model::{
    AppConfig, DEFAULT_ARTIFACT_DIR, DEFAULT_BIND_ADDR, DEFAULT_DB_MAX_CONNECTIONS, env,
};

const DB_CONNECTION_RANGE: RangeInclusive<u32> = 1..=100;

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first missing or invalid variable.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Blank values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first missing or invalid variable.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let database_url = read(env::DATABASE_URL).ok_or(ConfigError::MissingEnv {
            name: env::DATABASE_URL,
        })?;
        if !(database_url.starts_with("postgres://") || database_url.starts_with("postgresql://"))
        {
            return Err(ConfigError::invalid(
                env::DATABASE_URL,
                None,
                "unsupported_scheme",
            ));
        }

        let admin_secret = match lookup(env::ADMIN_PASSWORD) {
            None => {
                return Err(ConfigError::MissingEnv {
                    name: env::ADMIN_PASSWORD,
                });
            }
            Some(value) => AdminSecret::new(value)
                .ok_or_else(|| ConfigError::invalid(env::ADMIN_PASSWORD, None, "empty"))?,
        };

        let bind_raw = read(env::BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_raw.parse().map_err(|_| {
            ConfigError::invalid(env::BIND_ADDR, Some(&bind_raw), "invalid_socket_addr")
        })?;

        let artifact_dir =
            PathBuf::from(read(env::ARTIFACT_DIR).unwrap_or_else(|| DEFAULT_ARTIFACT_DIR.into()));

        let db_max_connections = match read(env::DB_MAX_CONNECTIONS) {
            None => DEFAULT_DB_MAX_CONNECTIONS,
            Some(raw) => parse_connections(&raw)?,
        };

        let log_level = read(env::LOG_LEVEL).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let log_format = match read(env::LOG_FORMAT) {
            None => LogFormat::infer(),
            Some(raw) => LogFormat::parse(&raw).ok_or_else(|| {
                ConfigError::invalid(env::LOG_FORMAT, Some(&raw), "unknown_format")
            })?,
        };

        Ok(Self {
            database_url,
            admin_secret,
            bind_addr,
            artifact_dir,
            db_max_connections,
            log_level,
            log_format,
        })
    }
}

fn parse_connections(raw: &str) -> ConfigResult<u32> {
    let value: u32 = raw
        .parse()
        .map_err(|_| ConfigError::invalid(env::DB_MAX_CONNECTIONS, Some(raw), "not_a_number"))?;
    if DB_CONNECTION_RANGE.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::invalid(
            env::DB_MAX_CONNECTIONS,
            Some(raw),
            "out_of_range",
        ))
    }
}
