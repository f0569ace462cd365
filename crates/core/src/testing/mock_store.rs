//! In-memory account store for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::account::{
    AccountRecord, AccountStatus, AccountStore, AccountStoreError, StatusUpdate,
};

/// A recorded status transition for test assertions.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub id: String,
    pub status: AccountStatus,
    pub comment: Option<String>,
    pub checked_at: Option<DateTime<Utc>>,
}

/// Mock implementation of the [`AccountStore`] trait backed by an
/// in-memory table.
///
/// Provides controllable behavior for testing:
/// - Seed records and read them back after a run
/// - Track every status transition in order
/// - Script fetch and update failures
pub struct MockAccountStore {
    records: Mutex<Vec<AccountRecord>>,
    changes: Mutex<Vec<StatusChange>>,
    fetches: Mutex<Vec<(String, AccountStatus, u32, u32)>>,
    fail_next_fetch: Mutex<Option<AccountStoreError>>,
    /// One scripted result per upcoming `update_status` call; `Some(err)`
    /// fails that call, `None` lets it through. An empty queue always
    /// lets calls through.
    update_script: Mutex<VecDeque<Option<AccountStoreError>>>,
}

impl Default for MockAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAccountStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            changes: Mutex::new(Vec::new()),
            fetches: Mutex::new(Vec::new()),
            fail_next_fetch: Mutex::new(None),
            update_script: Mutex::new(VecDeque::new()),
        }
    }

    /// Add records to the backing table.
    pub fn seed(&self, records: Vec<AccountRecord>) {
        self.records.lock().unwrap().extend(records);
    }

    /// Read a record back by id.
    pub fn record(&self, id: &str) -> Option<AccountRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Every status transition applied so far, in call order.
    pub fn changes(&self) -> Vec<StatusChange> {
        self.changes.lock().unwrap().clone()
    }

    /// Status transitions applied to one record, in call order.
    pub fn changes_for(&self, id: &str) -> Vec<StatusChange> {
        self.changes
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.id == id)
            .cloned()
            .collect()
    }

    /// Recorded fetch calls as `(service, status, limit, offset)`.
    pub fn fetches(&self) -> Vec<(String, AccountStatus, u32, u32)> {
        self.fetches.lock().unwrap().clone()
    }

    /// Fail the next fetch with `error`.
    pub fn fail_next_fetch(&self, error: AccountStoreError) {
        *self.fail_next_fetch.lock().unwrap() = Some(error);
    }

    /// Script the next `update_status` call to fail.
    pub fn push_update_error(&self, error: AccountStoreError) {
        self.update_script.lock().unwrap().push_back(Some(error));
    }

    /// Script the next `update_status` call to succeed, for positioning
    /// a later scripted failure.
    pub fn push_update_ok(&self) {
        self.update_script.lock().unwrap().push_back(None);
    }
}

#[async_trait]
impl AccountStore for MockAccountStore {
    async fn fetch_by_service_and_status(
        &self,
        service: &str,
        status: AccountStatus,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<AccountRecord>, AccountStoreError> {
        self.fetches
            .lock()
            .unwrap()
            .push((service.to_string(), status, limit, offset));
        if let Some(err) = self.fail_next_fetch.lock().unwrap().take() {
            return Err(err);
        }

        let records = self.records.lock().unwrap();
        let mut matched: Vec<AccountRecord> = records
            .iter()
            .filter(|r| r.service == service && r.status == status)
            .cloned()
            .collect();
        matched.sort_by_key(|r| r.created_at);
        Ok(matched
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn update_status(
        &self,
        id: &str,
        status: AccountStatus,
        update: StatusUpdate,
    ) -> Result<AccountRecord, AccountStoreError> {
        let scripted = self.update_script.lock().unwrap().pop_front();
        if let Some(Some(err)) = scripted {
            return Err(err);
        }

        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AccountStoreError::NotFound(id.to_string()))?;
        record.status = status;
        if let Some(comment) = &update.comment {
            record.comment = Some(comment.clone());
        }
        record.updated_at = Utc::now();

        self.changes.lock().unwrap().push(StatusChange {
            id: id.to_string(),
            status,
            comment: update.comment.clone(),
            checked_at: update.checked_at,
        });
        Ok(record.clone())
    }

    async fn exists_by_mailbox(&self, mailbox: &str) -> Result<bool, AccountStoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.mailbox == mailbox))
    }

    async fn fetch_by_mailbox(
        &self,
        mailbox: &str,
    ) -> Result<Option<AccountRecord>, AccountStoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.mailbox == mailbox)
            .cloned())
    }
}
