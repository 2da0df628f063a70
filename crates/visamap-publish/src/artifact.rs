//! Nested lookup mappings derived from the policy store.

use std::collections::BTreeMap;

use visamap_core::PolicyEntry;

use crate::error::{PublishError, PublishResult};

/// Mapping of origin -> destination -> value with lexicographically sorted keys.
pub type NestedMap<V> = BTreeMap<String, BTreeMap<String, V>>;

/// Both lookup documents derived from a full store read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyArtifacts {
    policies: NestedMap<u8>,
    durations: NestedMap<u32>,
}

/// Serialised artifact bodies, ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifacts {
    /// Body of `visaPolicy.json`.
    pub policy: Vec<u8>,
    /// Body of `visaDuration.json`.
    pub duration: Vec<u8>,
}

impl PolicyArtifacts {
    /// Group entries by origin then destination; later duplicates win.
    #[must_use]
    pub fn from_entries(entries: &[PolicyEntry]) -> Self {
        let mut artifacts = Self::default();
        for entry in entries {
            artifacts
                .policies
                .entry(entry.origin.clone())
                .or_default()
                .insert(entry.destination.clone(), entry.policy_code.code());
            artifacts
                .durations
                .entry(entry.origin.clone())
                .or_default()
                .insert(entry.destination.clone(), entry.duration_days);
        }
        artifacts
    }

    /// Policy codes keyed by origin then destination.
    #[must_use]
    pub const fn policies(&self) -> &NestedMap<u8> {
        &self.policies
    }

    /// Stay lengths keyed by origin then destination.
    #[must_use]
    pub const fn durations(&self) -> &NestedMap<u32> {
        &self.durations
    }

    /// Number of distinct origins.
    #[must_use]
    pub fn origin_count(&self) -> usize {
        self.policies.len()
    }

    /// Number of leaf values in each document.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.policies.values().map(BTreeMap::len).sum()
    }

    /// Whether no entries were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Render both documents as two-space indented JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Serialize`] if either document fails to serialise.
    pub fn render(&self) -> PublishResult<RenderedArtifacts> {
        let policy = serde_json::to_vec_pretty(&self.policies).map_err(|source| {
            PublishError::Serialize {
                artifact: "policy",
                source,
            }
        })?;
        let duration = serde_json::to_vec_pretty(&self.durations).map_err(|source| {
            PublishError::Serialize {
                artifact: "duration",
                source,
            }
        })?;
        Ok(RenderedArtifacts { policy, duration })
    }
}
