use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use super::prepared::PreparedAccount;
use super::types::{Workflow, WorkflowOutcome};
use crate::account::AccountRecord;
use crate::artifact::ArtifactSink;
use crate::browser::{BrowserDriver, BrowserError};
use crate::metrics;

/// Runs one workflow against one record inside a fresh browser session.
///
/// The runner owns everything service-agnostic around a workflow body:
/// building the [`PreparedAccount`], acquiring and always tearing down
/// the session, folding body errors into a [`WorkflowOutcome`] and
/// capturing a best-effort final-state screenshot. Only session
/// acquisition failures surface as errors; the orchestrator treats those
/// as fatal for the record.
pub struct WorkflowRunner {
    driver: Arc<dyn BrowserDriver>,
    artifacts: Arc<dyn ArtifactSink>,
    fixed_password: String,
}

impl WorkflowRunner {
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        artifacts: Arc<dyn ArtifactSink>,
        fixed_password: impl Into<String>,
    ) -> Self {
        Self {
            driver,
            artifacts,
            fixed_password: fixed_password.into(),
        }
    }

    /// Register `record` via `workflow`. `image_path` is the identity
    /// image the validation gate resolved.
    pub async fn run(
        &self,
        workflow: &dyn Workflow,
        record: &AccountRecord,
        image_path: PathBuf,
    ) -> Result<WorkflowOutcome, BrowserError> {
        let prepared = PreparedAccount::from_record(record, image_path, &self.fixed_password);
        let started = tokio::time::Instant::now();
        let session = self.driver.new_session().await?;

        info!(
            service = workflow.service(),
            account_id = %record.id,
            mailbox = %record.mailbox,
            "Running registration workflow"
        );

        let outcome = match workflow.run(session.as_ref(), record, &prepared).await {
            Ok(()) => WorkflowOutcome::Success,
            Err(e) => {
                warn!(
                    service = workflow.service(),
                    account_id = %record.id,
                    error = %e,
                    "Registration workflow failed"
                );
                WorkflowOutcome::Failed {
                    message: e.to_string(),
                }
            }
        };
        metrics::WORKFLOW_RUNS
            .with_label_values(&[workflow.service(), outcome.label()])
            .inc();
        metrics::WORKFLOW_DURATION
            .with_label_values(&[workflow.service()])
            .observe(started.elapsed().as_secs_f64());

        let screenshot_name = format!(
            "{}-{}-{}.png",
            workflow.service(),
            prepared.name_slug,
            outcome.label()
        );
        match session.screenshot().await {
            Ok(bytes) => {
                if let Err(e) = self.artifacts.save_screenshot(&screenshot_name, &bytes).await {
                    warn!(name = %screenshot_name, error = %e, "Failed to save workflow screenshot");
                }
            }
            Err(e) => {
                warn!(name = %screenshot_name, error = %e, "Failed to capture workflow screenshot");
            }
        }

        if let Err(e) = session.close().await {
            warn!(account_id = %record.id, error = %e, "Failed to close browser session");
        }

        Ok(outcome)
    }
}
