#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP DTOs for the visamap API.
//!
//! These types are re-used by the CLI for request/response encoding to keep the
//! contract deterministic. Request bodies also accept the legacy field names
//! (`passport`, `policy`, `duration`) so older admin tooling keeps working.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use visamap_core::{PolicyCode, PolicyDraft, PolicyEntry};

/// RFC9457-compatible problem document surfaced on validation/runtime errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    /// URI reference identifying the problem type.
    pub kind: String,
    /// Short, human-readable summary of the issue.
    pub title: String,
    /// HTTP status code associated with the error.
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Detailed diagnostic message when available.
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Parameters that failed validation, if applicable.
    pub invalid_params: Option<Vec<ProblemInvalidParam>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// `x-request-id` of the failed request, for correlating with server logs.
    pub request_id: Option<String>,
}

/// Invalid parameter pointer surfaced alongside a [`ProblemDetails`] payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemInvalidParam {
    /// JSON Pointer to the offending field.
    pub pointer: String,
    /// Human-readable description of the validation failure.
    pub message: String,
}

/// A stored policy row as rendered by the list and upsert endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyView {
    /// Passport-issuing country.
    pub origin: String,
    /// Country being entered.
    pub destination: String,
    /// Numeric policy category.
    pub policy_code: u8,
    /// Permitted stay in days.
    pub duration_days: u32,
}

impl From<PolicyEntry> for PolicyView {
    fn from(entry: PolicyEntry) -> Self {
        Self {
            origin: entry.origin,
            destination: entry.destination,
            policy_code: entry.policy_code.code(),
            duration_days: entry.duration_days,
        }
    }
}

impl PolicyView {
    /// Human label of the policy category, if the code is known.
    #[must_use]
    pub fn policy_label(&self) -> Option<&'static str> {
        PolicyCode::try_from(i64::from(self.policy_code))
            .ok()
            .map(PolicyCode::label)
    }
}

/// Query string accepted by the list endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyListQuery {
    /// Restrict to one origin.
    #[serde(default, alias = "passport", skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Restrict to one destination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

/// Body accepted by the upsert endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyUpsertRequest {
    /// Passport-issuing country.
    #[serde(default, alias = "passport")]
    pub origin: String,
    /// Country being entered.
    #[serde(default)]
    pub destination: String,
    /// Numeric policy category.
    #[serde(default, alias = "policy")]
    pub policy_code: Option<i64>,
    /// Permitted stay in days; defaults to zero.
    #[serde(default, alias = "duration", skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<i64>,
}

impl From<PolicyUpsertRequest> for PolicyDraft {
    fn from(request: PolicyUpsertRequest) -> Self {
        Self {
            origin: request.origin,
            destination: request.destination,
            policy_code: request.policy_code,
            duration_days: request.duration_days,
        }
    }
}

/// Body accepted by the delete endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyKeyRequest {
    /// Passport-issuing country.
    #[serde(default, alias = "passport")]
    pub origin: String,
    /// Country being entered.
    #[serde(default)]
    pub destination: String,
}

/// Body accepted by the auth-check endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthRequest {
    /// Candidate admin password.
    #[serde(default)]
    pub password: String,
}

/// Plain success acknowledgement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AckResponse {
    /// Always `true` on success.
    pub ok: bool,
}

impl AckResponse {
    /// Successful acknowledgement.
    #[must_use]
    pub const fn ok() -> Self {
        Self { ok: true }
    }
}

/// Acknowledgement of a delete; deleting a missing pair still succeeds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteResponse {
    /// Always `true` on success.
    pub ok: bool,
    /// Whether a stored entry existed and was removed.
    #[serde(default)]
    pub removed: bool,
}

/// Outcome of a publish request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    /// Always `true` on success.
    pub ok: bool,
    /// Distinct origins written.
    pub passports: usize,
    /// Total entries written.
    pub total_entries: usize,
    /// Completion timestamp.
    pub published_at: DateTime<Utc>,
}

/// Published values for one (origin, destination) pair; absent fields mean no data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LookupResponse {
    /// Requested origin.
    pub origin: String,
    /// Requested destination.
    pub destination: String,
    /// Published policy category.
    pub policy_code: Option<u8>,
    /// Label of the published policy category.
    pub policy_label: Option<String>,
    /// Published stay length in days.
    pub duration_days: Option<u32>,
}

/// Query string accepted by the lookup endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LookupQuery {
    /// Passport-issuing country.
    #[serde(default, alias = "passport")]
    pub origin: String,
    /// Country being entered.
    #[serde(default)]
    pub destination: String,
}

/// Health probe response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Build identifier.
    pub build: String,
    /// Stored entry count when the store is reachable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<u64>,
    /// Components that failed their probe.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<String>,
}
