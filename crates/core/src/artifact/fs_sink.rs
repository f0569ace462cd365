use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::sink::{ArtifactError, ArtifactSink};

/// Filesystem sink: screenshots under one directory, summaries under
/// another. Directories are created on first write.
pub struct FsArtifactSink {
    screenshot_dir: PathBuf,
    summary_dir: PathBuf,
}

impl FsArtifactSink {
    pub fn new(screenshot_dir: impl Into<PathBuf>, summary_dir: impl Into<PathBuf>) -> Self {
        Self {
            screenshot_dir: screenshot_dir.into(),
            summary_dir: summary_dir.into(),
        }
    }

    async fn write(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ArtifactError::io(name, e))?;
        let path = dir.join(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ArtifactError::io(name, e))?;
        debug!(path = %path.display(), bytes = bytes.len(), "Artifact written");
        Ok(path)
    }
}

#[async_trait]
impl ArtifactSink for FsArtifactSink {
    async fn save_screenshot(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
        Self::write(&self.screenshot_dir, name, bytes).await
    }

    async fn save_summary(
        &self,
        name: &str,
        summary: &serde_json::Value,
    ) -> Result<PathBuf, ArtifactError> {
        let bytes =
            serde_json::to_vec_pretty(summary).map_err(|e| ArtifactError::encode(name, e))?;
        Self::write(&self.summary_dir, name, &bytes).await
    }
}
