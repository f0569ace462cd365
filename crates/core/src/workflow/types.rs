//! Types for registration workflows.

use async_trait::async_trait;
use thiserror::Error;

use super::prepared::PreparedAccount;
use crate::account::AccountRecord;
use crate::browser::{BrowserError, BrowserSession};
use crate::captcha::CaptchaError;
use crate::mailbox::OtpError;

/// Errors a workflow body can raise while driving a registration page.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Browser automation failure.
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Captcha solving failure.
    #[error("captcha error: {0}")]
    Captcha(#[from] CaptchaError),

    /// Verification-code retrieval failure.
    #[error("verification code error: {0}")]
    Otp(#[from] OtpError),

    /// The target site refused the registration.
    #[error("registration rejected: {0}")]
    Rejected(String),

    /// Anything else that ends this record's registration.
    #[error("{0}")]
    Other(String),
}

/// How one workflow run ended. Workflow-body errors are folded in here;
/// only infrastructure failures surface as errors to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowOutcome {
    /// Registration completed; the account now awaits the service's
    /// validation.
    Success,
    /// The registration failed for this record.
    Failed { message: String },
}

impl WorkflowOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkflowOutcome::Success)
    }

    /// Label used in screenshot names and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            WorkflowOutcome::Success => "success",
            WorkflowOutcome::Failed { .. } => "error",
        }
    }
}

/// A service-specific registration script.
///
/// Implementations drive the signup pages of one target service. They
/// receive a live session plus the raw record and its prepared
/// projection; everything service-agnostic (session lifecycle,
/// screenshots, status persistence, pacing) stays outside.
#[async_trait]
pub trait Workflow: Send + Sync {
    /// Service name this workflow registers accounts on; the registry
    /// key.
    fn service(&self) -> &str;

    /// Run the registration for one account.
    async fn run(
        &self,
        session: &dyn BrowserSession,
        record: &AccountRecord,
        prepared: &PreparedAccount,
    ) -> Result<(), WorkflowError>;
}
