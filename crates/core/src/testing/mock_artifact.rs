//! Recording artifact sink for tests.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::artifact::{ArtifactError, ArtifactSink};

/// Mock implementation of the [`ArtifactSink`] trait that keeps every
/// artifact in memory. Reported paths live under a fake `/artifacts`
/// root; nothing touches the filesystem.
pub struct RecordingArtifactSink {
    screenshots: Mutex<Vec<(String, Vec<u8>)>>,
    summaries: Mutex<Vec<(String, serde_json::Value)>>,
    fail_screenshots: AtomicBool,
    fail_summaries: AtomicBool,
}

impl Default for RecordingArtifactSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingArtifactSink {
    pub fn new() -> Self {
        Self {
            screenshots: Mutex::new(Vec::new()),
            summaries: Mutex::new(Vec::new()),
            fail_screenshots: AtomicBool::new(false),
            fail_summaries: AtomicBool::new(false),
        }
    }

    /// Make every screenshot write fail.
    pub fn fail_screenshots(&self) {
        self.fail_screenshots.store(true, Ordering::SeqCst);
    }

    /// Make every summary write fail.
    pub fn fail_summaries(&self) {
        self.fail_summaries.store(true, Ordering::SeqCst);
    }

    /// Saved screenshots as `(name, bytes)`, in order.
    pub fn screenshots(&self) -> Vec<(String, Vec<u8>)> {
        self.screenshots.lock().unwrap().clone()
    }

    /// Saved screenshot names, in order.
    pub fn screenshot_names(&self) -> Vec<String> {
        self.screenshots
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Saved summaries as `(name, document)`, in order.
    pub fn summaries(&self) -> Vec<(String, serde_json::Value)> {
        self.summaries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactSink for RecordingArtifactSink {
    async fn save_screenshot(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
        if self.fail_screenshots.load(Ordering::SeqCst) {
            return Err(ArtifactError::io(
                name,
                std::io::Error::other("scripted sink failure"),
            ));
        }
        self.screenshots
            .lock()
            .unwrap()
            .push((name.to_string(), bytes.to_vec()));
        Ok(PathBuf::from("/artifacts/screenshots").join(name))
    }

    async fn save_summary(
        &self,
        name: &str,
        summary: &serde_json::Value,
    ) -> Result<PathBuf, ArtifactError> {
        if self.fail_summaries.load(Ordering::SeqCst) {
            return Err(ArtifactError::io(
                name,
                std::io::Error::other("scripted sink failure"),
            ));
        }
        self.summaries
            .lock()
            .unwrap()
            .push((name.to_string(), summary.clone()));
        Ok(PathBuf::from("/artifacts/summaries").join(name))
    }
}
