//! Storage abstraction implemented by policy backends.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::model::{PolicyEntry, PolicyFilter, PolicyKey};

/// Durable table of (origin, destination) policy rows.
///
/// Implementations own consistency: an upsert on an existing key replaces the
/// policy code and duration, last writer wins.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Entries matching the filter, ordered by destination ascending.
    async fn list(&self, filter: &PolicyFilter) -> StoreResult<Vec<PolicyEntry>>;

    /// Insert or replace the row for the entry's key and return the stored row.
    async fn upsert(&self, entry: &PolicyEntry) -> StoreResult<PolicyEntry>;

    /// Remove the row for the key; returns whether a row existed.
    async fn delete(&self, key: &PolicyKey) -> StoreResult<bool>;

    /// Every entry, ordered by origin then destination.
    async fn load_all(&self) -> StoreResult<Vec<PolicyEntry>>;

    /// Number of stored entries.
    async fn count(&self) -> StoreResult<u64>;
}

/// Shared, dynamically dispatched store handle.
pub type SharedPolicyStore = Arc<dyn PolicyStore>;
