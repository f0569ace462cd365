//! Account storage trait and types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::account::{AccountRecord, AccountStatus};

/// Error type for account store operations.
#[derive(Debug, Error)]
pub enum AccountStoreError {
    /// No record exists for the given identifier.
    #[error("Account not found: {0}")]
    NotFound(String),

    /// The datastore rejected the request.
    #[error("Datastore error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Request timed out.
    #[error("Datastore request timed out: {0}")]
    Timeout(String),

    /// Could not reach the datastore.
    #[error("Failed to connect to datastore: {0}")]
    Connection(String),

    /// Response body did not match the expected shape.
    #[error("Invalid datastore response: {0}")]
    InvalidResponse(String),
}

/// Extra fields written alongside a status transition.
///
/// The `comment` is overwritten on every transition; `checked_at` is set by
/// verification runs only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusUpdate {
    /// Human-readable diagnostic for the transition.
    pub comment: Option<String>,
    /// When a verification run last inspected the account.
    pub checked_at: Option<DateTime<Utc>>,
}

impl StatusUpdate {
    /// Create an empty update (status change only).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the diagnostic comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Set the verification timestamp.
    pub fn with_checked_at(mut self, checked_at: DateTime<Utc>) -> Self {
        self.checked_at = Some(checked_at);
        self
    }
}

/// Trait for the consumed account datastore surface.
///
/// This core owns no schema; it consumes exactly these four operations.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fetch a page of records for one service in one status, in stable
    /// queue order (oldest first).
    async fn fetch_by_service_and_status(
        &self,
        service: &str,
        status: AccountStatus,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<AccountRecord>, AccountStoreError>;

    /// Transition a record to `status` and overwrite the update fields.
    /// Returns the record as stored after the write.
    async fn update_status(
        &self,
        id: &str,
        status: AccountStatus,
        update: StatusUpdate,
    ) -> Result<AccountRecord, AccountStoreError>;

    /// Whether any record exists for the mailbox address.
    async fn exists_by_mailbox(&self, mailbox: &str) -> Result<bool, AccountStoreError>;

    /// Fetch a single record by its mailbox address.
    async fn fetch_by_mailbox(
        &self,
        mailbox: &str,
    ) -> Result<Option<AccountRecord>, AccountStoreError>;
}
