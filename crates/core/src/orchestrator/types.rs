//! Types for the account orchestrators.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::account::AccountStatus;

/// Errors that abort an orchestrator run.
///
/// Per-record failures never surface here; they are folded into the
/// record's own outcome so one bad record cannot take down the batch.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// No registered workflow for the requested service.
    #[error("no workflow registered for service: {0}")]
    UnknownService(String),

    /// No `[services.<name>]` configuration for the requested service.
    #[error("no service configuration for: {0}")]
    MissingServiceConfig(String),

    /// Single-record verification was asked for a mailbox the datastore
    /// does not know.
    #[error("no account found for mailbox: {0}")]
    MailboxNotFound(String),

    /// Account store error.
    #[error("account store error: {0}")]
    Store(#[from] crate::account::AccountStoreError),

    /// Artifact error.
    #[error("artifact error: {0}")]
    Artifact(#[from] crate::artifact::ArtifactError),
}

/// Final outcome of one record in a run.
#[derive(Debug, Clone, Serialize)]
pub struct RecordOutcome {
    /// Datastore id of the record.
    pub id: String,
    /// Mailbox address of the record.
    pub mailbox: String,
    /// Status the record ended the run in.
    pub status: AccountStatus,
    /// Diagnostic comment persisted with the transition, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Per-status tallies for a registration batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OutcomeCounts {
    /// Records that reached `pending` (account created).
    pub succeeded: usize,
    /// Records that ended in `error` (workflow reported failure).
    pub failed: usize,
    /// Records rejected by the validation gate.
    pub incomplete: usize,
    /// Records that ended in `fatal_error` (infrastructure failure).
    pub fatal: usize,
}

/// Summary of one registration batch, also written as the run's
/// summary artifact.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    /// Unique id for this run.
    pub run_id: String,
    /// Service the batch was processed for.
    pub service: String,
    /// When the batch finished.
    pub processed_at: DateTime<Utc>,
    /// Per-status tallies.
    pub counts: OutcomeCounts,
    /// Per-record outcomes in batch order.
    pub outcomes: Vec<RecordOutcome>,
}

impl BatchResult {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            service: service.into(),
            processed_at: Utc::now(),
            counts: OutcomeCounts::default(),
            outcomes: Vec::new(),
        }
    }

    /// Record an outcome and bump the matching tally.
    pub fn push(&mut self, outcome: RecordOutcome) {
        match outcome.status {
            AccountStatus::Pending => self.counts.succeeded += 1,
            AccountStatus::Error => self.counts.failed += 1,
            AccountStatus::Incomplete => self.counts.incomplete += 1,
            AccountStatus::FatalError => self.counts.fatal += 1,
            _ => {}
        }
        self.outcomes.push(outcome);
    }

    /// Total number of records processed.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// Per-classification tallies for a verification run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerificationCounts {
    /// Accounts confirmed active.
    pub verified: usize,
    /// Accounts still under review by the service.
    pub soon: usize,
    /// Accounts rejected or blocked by the service.
    pub rejected: usize,
    /// Accounts whose check could not be classified.
    pub errors: usize,
}

/// Summary of one verification run, also written as the run's
/// summary artifact.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationSummary {
    /// Unique id for this run.
    pub run_id: String,
    /// Service the accounts belong to.
    pub service: String,
    /// When the run finished.
    pub checked_at: DateTime<Utc>,
    /// Per-classification tallies.
    pub counts: VerificationCounts,
    /// Per-record outcomes in run order.
    pub outcomes: Vec<RecordOutcome>,
}

impl VerificationSummary {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            service: service.into(),
            checked_at: Utc::now(),
            counts: VerificationCounts::default(),
            outcomes: Vec::new(),
        }
    }

    /// Record an outcome and bump the matching tally.
    pub fn push(&mut self, outcome: RecordOutcome) {
        match outcome.status {
            AccountStatus::Verified => self.counts.verified += 1,
            AccountStatus::Soon => self.counts.soon += 1,
            AccountStatus::Rejected => self.counts.rejected += 1,
            AccountStatus::Error => self.counts.errors += 1,
            _ => {}
        }
        self.outcomes.push(outcome);
    }

    /// Total number of records checked.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(id: &str, status: AccountStatus) -> RecordOutcome {
        RecordOutcome {
            id: id.to_string(),
            mailbox: format!("{id}@demo.test"),
            status,
            comment: None,
        }
    }

    #[test]
    fn test_batch_result_tallies_by_status() {
        let mut result = BatchResult::new("demo");
        result.push(outcome("a", AccountStatus::Pending));
        result.push(outcome("b", AccountStatus::Error));
        result.push(outcome("c", AccountStatus::Incomplete));
        result.push(outcome("d", AccountStatus::FatalError));
        result.push(outcome("e", AccountStatus::Pending));

        assert_eq!(result.counts.succeeded, 2);
        assert_eq!(result.counts.failed, 1);
        assert_eq!(result.counts.incomplete, 1);
        assert_eq!(result.counts.fatal, 1);
        assert_eq!(result.total(), 5);
    }

    #[test]
    fn test_verification_summary_tallies_by_status() {
        let mut summary = VerificationSummary::new("demo");
        summary.push(outcome("a", AccountStatus::Verified));
        summary.push(outcome("b", AccountStatus::Soon));
        summary.push(outcome("c", AccountStatus::Rejected));
        summary.push(outcome("d", AccountStatus::Error));

        assert_eq!(summary.counts.verified, 1);
        assert_eq!(summary.counts.soon, 1);
        assert_eq!(summary.counts.rejected, 1);
        assert_eq!(summary.counts.errors, 1);
        assert_eq!(summary.total(), 4);
    }

    #[test]
    fn test_batch_result_serializes_status_names() {
        let mut result = BatchResult::new("demo");
        result.push(RecordOutcome {
            id: "acc-1".to_string(),
            mailbox: "a@demo.test".to_string(),
            status: AccountStatus::FatalError,
            comment: Some("Browser connection error: refused".to_string()),
        });

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcomes"][0]["status"], "fatal_error");
        assert_eq!(
            json["outcomes"][0]["comment"],
            "Browser connection error: refused"
        );
        assert_eq!(json["counts"]["fatal"], 1);
    }

    #[test]
    fn test_record_outcome_omits_absent_comment() {
        let json = serde_json::to_value(outcome("acc-1", AccountStatus::Pending)).unwrap();
        assert!(json.get("comment").is_none());
    }

    #[test]
    fn test_error_display() {
        let err = OrchestratorError::UnknownService("demo".to_string());
        assert_eq!(err.to_string(), "no workflow registered for service: demo");

        let err = OrchestratorError::MailboxNotFound("a@demo.test".to_string());
        assert_eq!(err.to_string(), "no account found for mailbox: a@demo.test");
    }
}
