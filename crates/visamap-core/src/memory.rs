//! In-process policy store used by tests and local tooling.

use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::model::{PolicyEntry, PolicyFilter, PolicyKey};
use crate::store::PolicyStore;

type Rows = BTreeMap<PolicyKey, PolicyEntry>;

/// `BTreeMap`-backed store keyed by (origin, destination).
#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
    rows: Mutex<Rows>,
    unavailable: AtomicBool,
}

impl MemoryPolicyStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the supplied entries; later duplicates win.
    #[must_use]
    pub fn with_entries(entries: impl IntoIterator<Item = PolicyEntry>) -> Self {
        let rows = entries
            .into_iter()
            .map(|entry| (entry.key(), entry))
            .collect();
        Self {
            rows: Mutex::new(rows),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Simulate an unreachable backend; every call fails while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn guard(&self, operation: &'static str) -> StoreResult<MutexGuard<'_, Rows>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                operation,
                source: Box::new(io::Error::new(
                    io::ErrorKind::NotConnected,
                    "memory store marked unavailable",
                )),
            });
        }
        Ok(self.rows.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn list(&self, filter: &PolicyFilter) -> StoreResult<Vec<PolicyEntry>> {
        let rows = self.guard("memory.list")?;
        let mut entries: Vec<PolicyEntry> = rows
            .values()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect();
        drop(rows);
        entries.sort_by(|left, right| {
            left.destination
                .cmp(&right.destination)
                .then_with(|| left.origin.cmp(&right.origin))
        });
        Ok(entries)
    }

    async fn upsert(&self, entry: &PolicyEntry) -> StoreResult<PolicyEntry> {
        let mut rows = self.guard("memory.upsert")?;
        rows.insert(entry.key(), entry.clone());
        Ok(entry.clone())
    }

    async fn delete(&self, key: &PolicyKey) -> StoreResult<bool> {
        let mut rows = self.guard("memory.delete")?;
        Ok(rows.remove(key).is_some())
    }

    async fn load_all(&self) -> StoreResult<Vec<PolicyEntry>> {
        let rows = self.guard("memory.load_all")?;
        Ok(rows.values().cloned().collect())
    }

    async fn count(&self) -> StoreResult<u64> {
        let rows = self.guard("memory.count")?;
        Ok(u64::try_from(rows.len()).unwrap_or(u64::MAX))
    }
}
