//! Lookup over committed artifacts, as consumed by the public views.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use visamap_core::PolicyCode;

use crate::artifact::NestedMap;
use crate::error::{PublishError, PublishResult};
use crate::writer::{DURATION_FILE, POLICY_FILE};

/// Result of looking up one (origin, destination) pair; `None` means no data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtifactLookup {
    /// Published policy category.
    pub policy: Option<PolicyCode>,
    /// Published stay length in days.
    pub duration_days: Option<u32>,
}

/// Reads `visaPolicy.json` and `visaDuration.json` from a directory.
#[derive(Debug, Clone)]
pub struct ArtifactReader {
    dir: PathBuf,
}

impl ArtifactReader {
    /// Read artifacts from the supplied directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Look up the published values for a pair.
    ///
    /// Missing files, origins, or destinations resolve to `None` fields.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Corrupt`] when an artifact exists but cannot be
    /// parsed, and [`PublishError::Io`] for read failures other than not-found.
    pub async fn lookup(&self, origin: &str, destination: &str) -> PublishResult<ArtifactLookup> {
        let policies: Option<NestedMap<PolicyCode>> = load(&self.dir.join(POLICY_FILE)).await?;
        let durations: Option<NestedMap<u32>> = load(&self.dir.join(DURATION_FILE)).await?;
        Ok(ArtifactLookup {
            policy: pick(policies.as_ref(), origin, destination),
            duration_days: pick(durations.as_ref(), origin, destination),
        })
    }
}

fn pick<V: Copy>(map: Option<&NestedMap<V>>, origin: &str, destination: &str) -> Option<V> {
    map?.get(origin)?.get(destination).copied()
}

async fn load<V: DeserializeOwned>(path: &Path) -> PublishResult<Option<NestedMap<V>>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(PublishError::io("read artifact", path, source)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| PublishError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}
