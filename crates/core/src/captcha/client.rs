use async_trait::async_trait;
use thiserror::Error;

use super::types::{CaptchaChallenge, TaskPoll};

#[derive(Debug, Error)]
pub enum CaptchaError {
    /// The overall solve deadline elapsed before the service produced a
    /// token.
    #[error("Captcha solve timed out after {waited_ms} ms")]
    Timeout { waited_ms: u64 },

    /// The solving service rejected the task or reported a failure.
    #[error("Captcha service error: {0}")]
    Service(String),

    #[error("Captcha API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Captcha connection error: {0}")]
    Connection(String),

    #[error("Invalid captcha response: {0}")]
    InvalidResponse(String),
}

/// Task-based captcha solving service: submit a challenge, then poll the
/// task until it produces a token.
#[async_trait]
pub trait CaptchaApi: Send + Sync {
    /// Submit a challenge; returns the service-side task id.
    async fn create_task(&self, challenge: &CaptchaChallenge) -> Result<i64, CaptchaError>;

    /// Poll a previously created task once.
    async fn fetch_result(&self, task_id: i64) -> Result<TaskPoll, CaptchaError>;
}
