use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to write artifact {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode artifact {name}: {source}")]
    Encode {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ArtifactError {
    pub fn io(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            name: name.into(),
            source,
        }
    }

    pub fn encode(name: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Encode {
            name: name.into(),
            source,
        }
    }
}

/// Where run evidence lands: screenshots of final page states and the
/// per-run JSON summaries. Callers own the file names.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Persist a PNG screenshot; returns the written path.
    async fn save_screenshot(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, ArtifactError>;

    /// Persist a JSON summary document; returns the written path.
    async fn save_summary(
        &self,
        name: &str,
        summary: &serde_json::Value,
    ) -> Result<PathBuf, ArtifactError>;
}
