//! Staged commit of the two artifact files.
//!
//! Both bodies are written to hidden temp files in the target directory and
//! fsync'd before either is renamed into place, so readers only ever observe
//! complete documents. Temp files are removed on any failure, and the previous
//! policy document is restored when the duration rename fails.

use std::fs;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::artifact::RenderedArtifacts;
use crate::error::{PublishError, PublishResult};

/// File name of the policy-code document.
pub const POLICY_FILE: &str = "visaPolicy.json";
/// File name of the stay-length document.
pub const DURATION_FILE: &str = "visaDuration.json";

/// Writes rendered artifacts into a directory.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    /// Target the supplied directory; it is created on first commit if missing.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory receiving the artifacts.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Replace both artifacts with the rendered bodies.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Io`] if the directory cannot be created or any
    /// staging, sync, or rename step fails.
    pub async fn commit(&self, rendered: &RenderedArtifacts) -> PublishResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| PublishError::io("create artifact dir", &self.dir, source))?;

        let policy = StagedFile::write(&self.dir, POLICY_FILE, &rendered.policy).await?;
        let duration = StagedFile::write(&self.dir, DURATION_FILE, &rendered.duration).await?;

        let backup = Backup::take(&self.dir, POLICY_FILE).await?;
        policy.commit().await?;
        if let Err(err) = duration.commit().await {
            backup.restore().await;
            return Err(err);
        }
        backup.discard().await;
        sync_dir(&self.dir).await;
        debug!(dir = %self.dir.display(), "artifacts committed");
        Ok(())
    }
}

struct StagedFile {
    temp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedFile {
    async fn write(dir: &Path, name: &str, bytes: &[u8]) -> PublishResult<Self> {
        let staged = Self {
            temp: dir.join(format!(".{name}.{}.tmp", Uuid::new_v4().simple())),
            target: dir.join(name),
            committed: false,
        };
        let mut file = File::create(&staged.temp)
            .await
            .map_err(|source| PublishError::io("stage artifact", &staged.temp, source))?;
        file.write_all(bytes)
            .await
            .map_err(|source| PublishError::io("write artifact", &staged.temp, source))?;
        file.sync_all()
            .await
            .map_err(|source| PublishError::io("sync artifact", &staged.temp, source))?;
        Ok(staged)
    }

    async fn commit(mut self) -> PublishResult<()> {
        tokio::fs::rename(&self.temp, &self.target)
            .await
            .map_err(|source| PublishError::io("rename artifact", &self.target, source))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.temp);
        }
    }
}

/// Hard link to the previous contents of an artifact, taken before it is replaced.
struct Backup {
    link: Option<PathBuf>,
    target: PathBuf,
}

impl Backup {
    async fn take(dir: &Path, name: &str) -> PublishResult<Self> {
        let target = dir.join(name);
        let link = dir.join(format!(".{name}.{}.bak", Uuid::new_v4().simple()));
        match tokio::fs::hard_link(&target, &link).await {
            Ok(()) => Ok(Self {
                link: Some(link),
                target,
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self { link: None, target })
            }
            Err(source) => Err(PublishError::io("back up artifact", &target, source)),
        }
    }

    async fn restore(mut self) {
        let outcome = match self.link.take() {
            Some(link) => tokio::fs::rename(&link, &self.target).await,
            None => tokio::fs::remove_file(&self.target).await,
        };
        if let Err(err) = outcome {
            warn!(path = %self.target.display(), error = %err, "failed to roll back artifact");
        }
    }

    async fn discard(mut self) {
        if let Some(link) = self.link.take() {
            let _ = tokio::fs::remove_file(link).await;
        }
    }
}

impl Drop for Backup {
    fn drop(&mut self) {
        if let Some(link) = &self.link {
            let _ = fs::remove_file(link);
        }
    }
}

async fn sync_dir(dir: &Path) {
    if let Ok(handle) = File::open(dir).await {
        let _ = handle.sync_all().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use visamap_test_support::scratch_dir;

    fn rendered(policy: &str, duration: &str) -> RenderedArtifacts {
        RenderedArtifacts {
            policy: policy.as_bytes().to_vec(),
            duration: duration.as_bytes().to_vec(),
        }
    }

    fn leftover_temps(dir: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for item in fs::read_dir(dir)? {
            let name = item?.file_name().to_string_lossy().into_owned();
            if name.ends_with(".tmp") || name.ends_with(".bak") {
                names.push(name);
            }
        }
        Ok(names)
    }

    #[tokio::test]
    async fn commit_creates_directory_and_files() -> Result<()> {
        let scratch = scratch_dir()?;
        let dir = scratch.path().join("public");
        let writer = ArtifactWriter::new(&dir);
        writer.commit(&rendered("{}", "{\"a\": {}}")).await?;

        assert_eq!(fs::read_to_string(dir.join(POLICY_FILE))?, "{}");
        assert_eq!(fs::read_to_string(dir.join(DURATION_FILE))?, "{\"a\": {}}");
        assert!(leftover_temps(&dir)?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn commit_overwrites_previous_artifacts() -> Result<()> {
        let scratch = scratch_dir()?;
        let writer = ArtifactWriter::new(scratch.path());
        writer.commit(&rendered("old", "old")).await?;
        writer.commit(&rendered("new-policy", "new-duration")).await?;

        assert_eq!(
            fs::read_to_string(scratch.path().join(POLICY_FILE))?,
            "new-policy"
        );
        assert_eq!(
            fs::read_to_string(scratch.path().join(DURATION_FILE))?,
            "new-duration"
        );
        Ok(())
    }

    #[tokio::test]
    async fn failed_duration_rename_restores_previous_policy() -> Result<()> {
        let scratch = scratch_dir()?;
        fs::write(scratch.path().join(POLICY_FILE), "old-policy")?;
        fs::create_dir(scratch.path().join(DURATION_FILE))?;
        fs::write(scratch.path().join(DURATION_FILE).join("occupant"), "x")?;

        let writer = ArtifactWriter::new(scratch.path());
        let result = writer.commit(&rendered("new-policy", "{}")).await;
        assert!(matches!(
            result,
            Err(PublishError::Io {
                operation: "rename artifact",
                ..
            })
        ));
        assert_eq!(
            fs::read_to_string(scratch.path().join(POLICY_FILE))?,
            "old-policy"
        );
        assert!(leftover_temps(scratch.path())?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn failed_first_publish_leaves_no_policy_file() -> Result<()> {
        let scratch = scratch_dir()?;
        fs::create_dir(scratch.path().join(DURATION_FILE))?;
        fs::write(scratch.path().join(DURATION_FILE).join("occupant"), "x")?;

        let writer = ArtifactWriter::new(scratch.path());
        assert!(writer.commit(&rendered("{}", "{}")).await.is_err());
        assert!(!scratch.path().join(POLICY_FILE).exists());
        assert!(leftover_temps(scratch.path())?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn commit_into_file_path_fails() -> Result<()> {
        let scratch = scratch_dir()?;
        let blocker = scratch.path().join("blocker");
        fs::write(&blocker, "not a dir")?;

        let writer = ArtifactWriter::new(&blocker);
        let result = writer.commit(&rendered("{}", "{}")).await;
        assert!(matches!(
            result,
            Err(PublishError::Io {
                operation: "create artifact dir",
                ..
            })
        ));
        assert_eq!(fs::read_to_string(&blocker)?, "not a dir");
        Ok(())
    }
}
