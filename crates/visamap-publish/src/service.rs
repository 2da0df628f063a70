//! The publish operation: credential check, full store read, staged commit.

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};
use visamap_core::{AdminSecret, SharedPolicyStore};

use crate::artifact::PolicyArtifacts;
use crate::error::{PublishError, PublishResult};
use crate::writer::ArtifactWriter;

/// Outcome of a successful publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishReport {
    /// Distinct origins written.
    pub origins: usize,
    /// Total entries written.
    pub entries: usize,
    /// Completion timestamp.
    pub published_at: DateTime<Utc>,
}

/// Regenerates both artifacts from the current store contents.
#[derive(Clone)]
pub struct Publisher {
    store: SharedPolicyStore,
    secret: AdminSecret,
    writer: ArtifactWriter,
}

impl Publisher {
    /// Wire a publisher around the store, admin secret, and artifact writer.
    #[must_use]
    pub const fn new(store: SharedPolicyStore, secret: AdminSecret, writer: ArtifactWriter) -> Self {
        Self {
            store,
            secret,
            writer,
        }
    }

    /// Regenerate `visaPolicy.json` and `visaDuration.json` in full.
    ///
    /// A mutation racing with the read may or may not be reflected; there is
    /// no snapshot isolation.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Unauthorized`] for a bad credential,
    /// [`PublishError::Store`] if the read fails, [`PublishError::EmptyStore`]
    /// when there is nothing to publish, and IO or serialisation errors from the
    /// commit. Previous artifacts are left in place on every error raised
    /// before the commit's rename step.
    #[instrument(name = "publisher.publish", skip_all, fields(dir = %self.writer.dir().display()))]
    pub async fn publish(&self, credential: &str) -> PublishResult<PublishReport> {
        if !self.secret.verify(credential) {
            warn!("publish rejected: admin credential mismatch");
            return Err(PublishError::Unauthorized);
        }

        let entries = self
            .store
            .load_all()
            .await
            .map_err(|source| PublishError::Store {
                operation: "publish.load_all",
                source,
            })?;
        if entries.is_empty() {
            warn!("publish rejected: store is empty");
            return Err(PublishError::EmptyStore);
        }

        let artifacts = PolicyArtifacts::from_entries(&entries);
        let rendered = artifacts.render()?;
        self.writer.commit(&rendered).await?;

        let report = PublishReport {
            origins: artifacts.origin_count(),
            entries: artifacts.entry_count(),
            published_at: Utc::now(),
        };
        info!(
            origins = report.origins,
            entries = report.entries,
            "artifacts published"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::{DURATION_FILE, POLICY_FILE};
    use anyhow::Result;
    use serde_json::{Value, json};
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use visamap_core::{MemoryPolicyStore, PolicyCode, PolicyStore};
    use visamap_test_support::{ADMIN_PASSWORD, entry, sample_entries, scratch_dir};

    fn publisher(store: Arc<MemoryPolicyStore>, dir: &Path) -> Result<Publisher> {
        let secret = AdminSecret::new(ADMIN_PASSWORD).ok_or_else(|| anyhow::anyhow!("secret"))?;
        Ok(Publisher::new(store, secret, ArtifactWriter::new(dir)))
    }

    fn read_json(path: &Path) -> Result<Value> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    #[tokio::test]
    async fn publishes_single_entry_store() -> Result<()> {
        let scratch = scratch_dir()?;
        let store = Arc::new(MemoryPolicyStore::with_entries([entry(
            "Germany",
            "Canada",
            PolicyCode::VisaFree,
            180,
        )]));
        let report = publisher(store, scratch.path())?
            .publish(ADMIN_PASSWORD)
            .await?;
        assert_eq!(report.origins, 1);
        assert_eq!(report.entries, 1);
        assert_eq!(
            read_json(&scratch.path().join(POLICY_FILE))?,
            json!({"Germany": {"Canada": 7}})
        );
        assert_eq!(
            read_json(&scratch.path().join(DURATION_FILE))?,
            json!({"Germany": {"Canada": 180}})
        );
        Ok(())
    }

    #[tokio::test]
    async fn empty_store_is_rejected_without_writing() -> Result<()> {
        let scratch = scratch_dir()?;
        let publisher = publisher(Arc::new(MemoryPolicyStore::new()), scratch.path())?;
        assert!(matches!(
            publisher.publish(ADMIN_PASSWORD).await,
            Err(PublishError::EmptyStore)
        ));
        assert!(!scratch.path().join(POLICY_FILE).exists());
        Ok(())
    }

    #[tokio::test]
    async fn wrong_credential_is_checked_before_store() -> Result<()> {
        let scratch = scratch_dir()?;
        let store = Arc::new(MemoryPolicyStore::new());
        store.set_unavailable(true);
        let publisher = publisher(store, scratch.path())?;
        assert!(matches!(
            publisher.publish("guess").await,
            Err(PublishError::Unauthorized)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn store_failure_leaves_previous_artifacts() -> Result<()> {
        let scratch = scratch_dir()?;
        let store = Arc::new(MemoryPolicyStore::with_entries(sample_entries()));
        let publisher = publisher(Arc::clone(&store), scratch.path())?;
        publisher.publish(ADMIN_PASSWORD).await?;
        let before = fs::read(scratch.path().join(POLICY_FILE))?;

        store.set_unavailable(true);
        assert!(matches!(
            publisher.publish(ADMIN_PASSWORD).await,
            Err(PublishError::Store { .. })
        ));
        assert_eq!(fs::read(scratch.path().join(POLICY_FILE))?, before);
        Ok(())
    }

    #[tokio::test]
    async fn republishing_is_byte_identical() -> Result<()> {
        let scratch = scratch_dir()?;
        let store = Arc::new(MemoryPolicyStore::with_entries(sample_entries()));
        let publisher = publisher(Arc::clone(&store), scratch.path())?;

        let first = publisher.publish(ADMIN_PASSWORD).await?;
        let policy = fs::read(scratch.path().join(POLICY_FILE))?;
        let duration = fs::read(scratch.path().join(DURATION_FILE))?;
        let second = publisher.publish(ADMIN_PASSWORD).await?;

        assert_eq!(fs::read(scratch.path().join(POLICY_FILE))?, policy);
        assert_eq!(fs::read(scratch.path().join(DURATION_FILE))?, duration);
        assert_eq!(first.entries, second.entries);
        assert_eq!(first.entries, usize::try_from(store.count().await?)?);
        Ok(())
    }
}
