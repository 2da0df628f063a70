//! Error types for policy store and gateway operations.
//!
//! # Design
//!
//! - Keep error messages constant; carry operation and field context in structured fields.
//! - Preserve store sources so the HTTP layer can log them without re-wrapping.

use std::error::Error;

use thiserror::Error;

/// Errors raised by [`crate::PolicyStore`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached or rejected the query.
    #[error("policy store unavailable")]
    Unavailable {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying transport or query failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A persisted row could not be mapped onto a policy entry.
    #[error("stored policy row is invalid")]
    InvalidRow {
        /// Column that failed to decode.
        field: &'static str,
        /// Offending value rendered as text.
        value: String,
    },
}

/// Convenience alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by [`crate::PolicyGateway`] operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The supplied credential did not match the configured admin secret.
    #[error("unauthorized")]
    Unauthorized,
    /// A required field was missing or out of range.
    #[error("invalid policy entry")]
    Validation {
        /// Field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// The underlying store failed.
    #[error("policy store unavailable")]
    StoreUnavailable {
        /// Operation identifier.
        operation: &'static str,
        /// Source store error.
        #[source]
        source: StoreError,
    },
}

impl GatewayError {
    pub(crate) const fn validation(field: &'static str, reason: &'static str) -> Self {
        Self::Validation { field, reason }
    }

    pub(crate) const fn store(operation: &'static str, source: StoreError) -> Self {
        Self::StoreUnavailable { operation, source }
    }
}

/// Convenience alias for gateway results.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Raised when an integer does not name one of the known policy categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown policy code")]
pub struct UnknownPolicyCode {
    /// The rejected code.
    pub code: i64,
}
