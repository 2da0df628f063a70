//! Errors raised while publishing or reading artifacts.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use visamap_core::StoreError;

/// Failures surfaced by the publishing pipeline.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The supplied credential did not match the admin secret.
    #[error("unauthorized")]
    Unauthorized,
    /// The store held no rows to publish.
    #[error("no policy data in store")]
    EmptyStore,
    /// Reading the store failed.
    #[error("policy store unavailable")]
    Store {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },
    /// A filesystem step of the commit or lookup failed.
    #[error("artifact io failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Artifacts could not be serialised.
    #[error("artifact serialisation failed")]
    Serialize {
        /// Artifact being rendered.
        artifact: &'static str,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// A committed artifact could not be parsed.
    #[error("artifact is corrupt")]
    Corrupt {
        /// Path of the unreadable artifact.
        path: PathBuf,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

impl PublishError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias for publishing results.
pub type PublishResult<T> = Result<T, PublishError>;
