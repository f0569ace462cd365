//! Registration batch driver.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::account::{AccountRecord, AccountStatus, AccountStore, StatusUpdate};
use crate::artifact::{ArtifactError, ArtifactSink};
use crate::config::OrchestratorConfig;
use crate::metrics;
use crate::validation::ValidationGate;
use crate::workflow::{Workflow, WorkflowOutcome, WorkflowRegistry, WorkflowRunner};

use super::types::{BatchResult, OrchestratorError, RecordOutcome};

/// Drives one batch of `new` records through the account state machine.
///
/// Per record: validate, claim with a `processing` write, run the service
/// workflow, persist the terminal status. Every per-record failure is
/// folded into that record's outcome so the batch always runs to the end;
/// only the initial fetch and the final summary artifact write abort the
/// run.
///
/// The claim is a plain status write after the batch read, not an atomic
/// reservation: two runs over the same service can both pick up a record
/// before either claim lands, so runs are serialized per service by the
/// operator. A run that dies after claiming leaves the record parked in
/// `processing`; nothing re-queues it automatically.
pub struct AccountLifecycleOrchestrator {
    store: Arc<dyn AccountStore>,
    registry: Arc<WorkflowRegistry>,
    gate: ValidationGate,
    runner: WorkflowRunner,
    artifacts: Arc<dyn ArtifactSink>,
    config: OrchestratorConfig,
}

impl AccountLifecycleOrchestrator {
    pub fn new(
        store: Arc<dyn AccountStore>,
        registry: Arc<WorkflowRegistry>,
        gate: ValidationGate,
        runner: WorkflowRunner,
        artifacts: Arc<dyn ArtifactSink>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            registry,
            gate,
            runner,
            artifacts,
            config,
        }
    }

    /// Process the next batch of `new` records for `service`.
    ///
    /// Records that reached the workflow stage are separated by the
    /// configured inter-record delay; the last record and records the
    /// validation gate turned away are not followed by one. The batch
    /// summary artifact is written even when the batch is empty.
    pub async fn run(&self, service: &str) -> Result<BatchResult, OrchestratorError> {
        let workflow = self
            .registry
            .get(service)
            .ok_or_else(|| OrchestratorError::UnknownService(service.to_string()))?;

        let records = self
            .store
            .fetch_by_service_and_status(service, AccountStatus::New, self.config.batch_limit, 0)
            .await?;

        if records.is_empty() {
            info!(service, "No new records to process");
        } else {
            info!(service, count = records.len(), "Processing registration batch");
        }

        let mut result = BatchResult::new(service);
        let total = records.len();
        for (index, record) in records.iter().enumerate() {
            let (outcome, paced) = self.process_record(workflow.as_ref(), record).await;
            metrics::REGISTRATION_OUTCOMES
                .with_label_values(&[service, outcome.status.as_str()])
                .inc();
            result.push(outcome);

            if paced && index + 1 < total {
                debug!(
                    delay_ms = self.config.inter_record_delay_ms,
                    "Pacing before next record"
                );
                tokio::time::sleep(self.config.inter_record_delay()).await;
            }
        }
        result.processed_at = Utc::now();

        let name = format!("{}_accounts_{}.json", service, Utc::now().format("%Y-%m-%d"));
        let summary =
            serde_json::to_value(&result).map_err(|e| ArtifactError::encode(&name, e))?;
        let path = self.artifacts.save_summary(&name, &summary).await?;

        info!(
            service,
            succeeded = result.counts.succeeded,
            failed = result.counts.failed,
            incomplete = result.counts.incomplete,
            fatal = result.counts.fatal,
            summary = %path.display(),
            "Registration batch finished"
        );
        Ok(result)
    }

    /// Drive one record; the second value reports whether it reached the
    /// workflow stage and should be followed by the pacing delay.
    async fn process_record(
        &self,
        workflow: &dyn Workflow,
        record: &AccountRecord,
    ) -> (RecordOutcome, bool) {
        debug!(account_id = %record.id, mailbox = %record.mailbox, "Processing record");

        let report = self.gate.validate(record);
        let image_path = match report.image_path {
            Some(path) if report.is_valid => path,
            _ => {
                let comment = format!("missing fields: {}", report.missing_fields.join(", "));
                warn!(account_id = %record.id, comment = %comment, "Record failed validation");
                if let Err(e) = self
                    .store
                    .update_status(
                        &record.id,
                        AccountStatus::Incomplete,
                        StatusUpdate::new().with_comment(comment.clone()),
                    )
                    .await
                {
                    warn!(account_id = %record.id, error = %e, "Failed to persist incomplete status");
                }
                return (outcome(record, AccountStatus::Incomplete, comment), false);
            }
        };

        if let Err(e) = self
            .store
            .update_status(
                &record.id,
                AccountStatus::Processing,
                StatusUpdate::new().with_comment("registration started"),
            )
            .await
        {
            return (self.fail_fatal(record, e.to_string()).await, false);
        }

        match self.runner.run(workflow, record, image_path).await {
            Ok(WorkflowOutcome::Success) => {
                let comment = format!("created: {}", record.mailbox);
                if let Err(e) = self
                    .store
                    .update_status(
                        &record.id,
                        AccountStatus::Pending,
                        StatusUpdate::new().with_comment(comment.clone()),
                    )
                    .await
                {
                    return (self.fail_fatal(record, e.to_string()).await, true);
                }
                info!(account_id = %record.id, mailbox = %record.mailbox, "Account created");
                (outcome(record, AccountStatus::Pending, comment), true)
            }
            Ok(WorkflowOutcome::Failed { message }) => {
                if let Err(e) = self
                    .store
                    .update_status(
                        &record.id,
                        AccountStatus::Error,
                        StatusUpdate::new().with_comment(message.clone()),
                    )
                    .await
                {
                    return (self.fail_fatal(record, e.to_string()).await, true);
                }
                (outcome(record, AccountStatus::Error, message), true)
            }
            Err(e) => (self.fail_fatal(record, e.to_string()).await, true),
        }
    }

    /// Terminal path for exceptions the workflow's own handling did not
    /// absorb. The persist itself is best-effort; a failure here must not
    /// stop the batch.
    async fn fail_fatal(&self, record: &AccountRecord, message: String) -> RecordOutcome {
        error!(account_id = %record.id, error = %message, "Record failed fatally");
        if let Err(e) = self
            .store
            .update_status(
                &record.id,
                AccountStatus::FatalError,
                StatusUpdate::new().with_comment(message.clone()),
            )
            .await
        {
            warn!(account_id = %record.id, error = %e, "Failed to persist fatal_error status");
        }
        outcome(record, AccountStatus::FatalError, message)
    }
}

fn outcome(record: &AccountRecord, status: AccountStatus, comment: String) -> RecordOutcome {
    RecordOutcome {
        id: record.id.clone(),
        mailbox: record.mailbox.clone(),
        status,
        comment: Some(comment),
    }
}
