use async_trait::async_trait;
use thiserror::Error;

use super::types::MailMessage;

#[derive(Debug, Error)]
pub enum OtpError {
    #[error("No verification code found after {attempts} attempts")]
    NotFound { attempts: u32 },

    #[error("Mailbox service error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Mailbox request timed out: {0}")]
    Timeout(String),

    #[error("Mailbox connection error: {0}")]
    Connection(String),

    #[error("Invalid mailbox response: {0}")]
    InvalidResponse(String),
}

/// Read side of a disposable-mailbox provider.
#[async_trait]
pub trait MailboxClient: Send + Sync {
    /// Fetch every message currently in `mailbox`, most recent first.
    /// An empty inbox is `Ok(vec![])`, not an error.
    async fn fetch_messages(&self, mailbox: &str) -> Result<Vec<MailMessage>, OtpError>;
}
