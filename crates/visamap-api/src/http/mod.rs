//! HTTP surface modules (router, middleware, handlers).

/// Admin credential capture middleware.
pub(crate) mod auth;
/// Shared constants and header names.
pub(crate) mod constants;
/// Problem response helpers and error mapping.
pub(crate) mod errors;
/// Health and metrics endpoints.
pub(crate) mod health;
/// Public lookup over published artifacts.
pub(crate) mod lookup;
/// Policy list, upsert, delete, and auth-check handlers.
pub(crate) mod policies;
/// Publish handler.
pub(crate) mod publish;
/// Router construction and server host.
pub mod router;
/// Metrics middleware for HTTP requests.
pub(crate) mod telemetry;
