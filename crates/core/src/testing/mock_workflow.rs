//! Scriptable workflow for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::account::AccountRecord;
use crate::browser::BrowserSession;
use crate::workflow::{PreparedAccount, Workflow, WorkflowError};

/// Mock implementation of the [`Workflow`] trait.
///
/// Each run pops the next scripted result (succeeding once the script is
/// spent) and records the account id plus the prepared projection it was
/// handed.
pub struct MockWorkflow {
    service: String,
    results: Mutex<VecDeque<Result<(), WorkflowError>>>,
    runs: Mutex<Vec<(String, PreparedAccount)>>,
}

impl MockWorkflow {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            results: Mutex::new(VecDeque::new()),
            runs: Mutex::new(Vec::new()),
        }
    }

    /// Script the next run's result.
    pub fn push_result(&self, result: Result<(), WorkflowError>) {
        self.results.lock().unwrap().push_back(result);
    }

    /// `(account id, prepared projection)` per run, in order.
    pub fn runs(&self) -> Vec<(String, PreparedAccount)> {
        self.runs.lock().unwrap().clone()
    }

    /// Account ids run, in order.
    pub fn run_ids(&self) -> Vec<String> {
        self.runs
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[async_trait]
impl Workflow for MockWorkflow {
    fn service(&self) -> &str {
        &self.service
    }

    async fn run(
        &self,
        _session: &dyn BrowserSession,
        record: &AccountRecord,
        prepared: &PreparedAccount,
    ) -> Result<(), WorkflowError> {
        self.runs
            .lock()
            .unwrap()
            .push((record.id.clone(), prepared.clone()));
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }
}
