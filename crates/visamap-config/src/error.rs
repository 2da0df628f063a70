//! Error types for configuration loading.

use thiserror::Error;

/// Primary error type for configuration loading.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable was not set.
    #[error("required environment variable missing")]
    MissingEnv {
        /// Variable name.
        name: &'static str,
    },
    /// An environment variable held an unusable value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Variable name.
        field: &'static str,
        /// Offending value when it is safe to echo.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, value: Option<&str>, reason: &'static str) -> Self {
        Self::InvalidField {
            field,
            value: value.map(str::to_string),
            reason,
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
