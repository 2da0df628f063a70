//! Query/mutation gateway mediating all access to a [`PolicyStore`].
//!
//! # Design
//! - Reads are unauthenticated; mutations require the shared admin secret.
//! - Mutations validate key fields before checking the credential, so a malformed
//!   request reports a validation failure whatever credential accompanies it.
//! - Store failures are surfaced immediately; nothing is retried.

use tracing::{info, instrument, warn};

use crate::auth::AdminSecret;
use crate::error::{GatewayError, GatewayResult};
use crate::model::{
    MAX_DURATION_DAYS, PolicyCode, PolicyDraft, PolicyEntry, PolicyFilter, PolicyKey,
};
use crate::store::SharedPolicyStore;

/// Acknowledgement returned by [`PolicyGateway::delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteAck {
    /// Whether a row existed before the delete.
    pub removed: bool,
}

/// Validated, credential-checked access to the policy store.
#[derive(Clone)]
pub struct PolicyGateway {
    store: SharedPolicyStore,
    secret: AdminSecret,
}

impl PolicyGateway {
    /// Wire the gateway around a store and the configured admin secret.
    #[must_use]
    pub const fn new(store: SharedPolicyStore, secret: AdminSecret) -> Self {
        Self { store, secret }
    }

    /// Underlying store handle.
    #[must_use]
    pub const fn store(&self) -> &SharedPolicyStore {
        &self.store
    }

    /// Check a caller-supplied credential against the admin secret.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unauthorized`] when the credential does not match exactly.
    pub fn check_credential(&self, credential: &str) -> GatewayResult<()> {
        if self.secret.verify(credential) {
            Ok(())
        } else {
            warn!("admin credential rejected");
            Err(GatewayError::Unauthorized)
        }
    }

    /// List entries matching the filter, ordered by destination.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the store query fails.
    pub async fn list(&self, filter: &PolicyFilter) -> GatewayResult<Vec<PolicyEntry>> {
        self.store
            .list(filter)
            .await
            .map_err(|source| GatewayError::store("policy.list", source))
    }

    /// Insert or replace the entry for the draft's (origin, destination) pair.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] for malformed drafts,
    /// [`GatewayError::Unauthorized`] for a bad credential, and
    /// [`GatewayError::StoreUnavailable`] if the store write fails.
    #[instrument(
        name = "policy.upsert",
        skip_all,
        fields(origin = %draft.origin, destination = %draft.destination)
    )]
    pub async fn upsert(&self, draft: PolicyDraft, credential: &str) -> GatewayResult<PolicyEntry> {
        let entry = validate_draft(draft)?;
        self.check_credential(credential)?;

        let stored = self
            .store
            .upsert(&entry)
            .await
            .map_err(|source| GatewayError::store("policy.upsert", source))?;
        info!(
            policy = stored.policy_code.code(),
            duration_days = stored.duration_days,
            "policy entry stored"
        );
        Ok(stored)
    }

    /// Remove the entry for the pair; deleting a missing pair still succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] for empty keys,
    /// [`GatewayError::Unauthorized`] for a bad credential, and
    /// [`GatewayError::StoreUnavailable`] if the store delete fails.
    #[instrument(
        name = "policy.delete",
        skip_all,
        fields(origin = %origin, destination = %destination)
    )]
    pub async fn delete(
        &self,
        origin: &str,
        destination: &str,
        credential: &str,
    ) -> GatewayResult<DeleteAck> {
        let key = validate_key(origin, destination)?;
        self.check_credential(credential)?;

        let removed = self
            .store
            .delete(&key)
            .await
            .map_err(|source| GatewayError::store("policy.delete", source))?;
        info!(removed, "policy entry deleted");
        Ok(DeleteAck { removed })
    }
}

fn validate_key(origin: &str, destination: &str) -> GatewayResult<PolicyKey> {
    if is_blank(origin) {
        return Err(GatewayError::validation("origin", "required"));
    }
    if is_blank(destination) {
        return Err(GatewayError::validation("destination", "required"));
    }
    Ok(PolicyKey {
        origin: origin.to_string(),
        destination: destination.to_string(),
    })
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn validate_draft(draft: PolicyDraft) -> GatewayResult<PolicyEntry> {
    let PolicyKey {
        origin,
        destination,
    } = validate_key(&draft.origin, &draft.destination)?;

    let raw_code = draft
        .policy_code
        .ok_or_else(|| GatewayError::validation("policyCode", "required"))?;
    let policy_code = PolicyCode::try_from(raw_code)
        .map_err(|_| GatewayError::validation("policyCode", "unknown_code"))?;

    let raw_duration = draft.duration_days.unwrap_or(0);
    let duration_days = u32::try_from(raw_duration)
        .ok()
        .filter(|days| *days <= MAX_DURATION_DAYS)
        .ok_or_else(|| GatewayError::validation("durationDays", "out_of_range"))?;

    Ok(PolicyEntry {
        origin,
        destination,
        policy_code,
        duration_days,
    })
}
