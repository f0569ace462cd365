//! Verification run driver.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::account::{AccountRecord, AccountStatus, AccountStore, StatusUpdate};
use crate::artifact::{ArtifactError, ArtifactSink};
use crate::browser::{BrowserDriver, BrowserError, BrowserSession};
use crate::config::{OrchestratorConfig, ServiceConfig};
use crate::metrics;

use super::types::{OrchestratorError, RecordOutcome, VerificationSummary};

const EMAIL_SELECTOR: &str = "input[type='email']";
const PASSWORD_SELECTOR: &str = "input[type='password']";

/// Checks created accounts by logging into the target service with the
/// fixed credentials and reading the resulting page.
///
/// Classification, in order: a post-login URL that still looks like the
/// login page means the login was rejected or blocked (`error`), the
/// service's processing marker means the account is still under review
/// (`soon`), its rejected marker means `rejected`, anything else counts
/// as `verified`. Every check captures a full-page screenshot named by
/// mailbox and classification, and every persisted transition carries
/// the check time.
///
/// Per-record failures are folded into that record's outcome; only the
/// record selection and the final summary artifact write abort a run.
pub struct VerificationOrchestrator {
    store: Arc<dyn AccountStore>,
    driver: Arc<dyn BrowserDriver>,
    artifacts: Arc<dyn ArtifactSink>,
    services: BTreeMap<String, ServiceConfig>,
    config: OrchestratorConfig,
}

impl VerificationOrchestrator {
    pub fn new(
        store: Arc<dyn AccountStore>,
        driver: Arc<dyn BrowserDriver>,
        artifacts: Arc<dyn ArtifactSink>,
        services: BTreeMap<String, ServiceConfig>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            driver,
            artifacts,
            services,
            config,
        }
    }

    /// Check every `service` record currently in `status`.
    pub async fn run_batch(
        &self,
        service: &str,
        status: AccountStatus,
    ) -> Result<VerificationSummary, OrchestratorError> {
        let service_config = self.service_config(service)?;
        let records = self
            .store
            .fetch_by_service_and_status(service, status, self.config.batch_limit, 0)
            .await?;

        if records.is_empty() {
            info!(service, status = %status, "No accounts to check");
        } else {
            info!(service, status = %status, count = records.len(), "Checking accounts");
        }
        self.check_all(service, service_config, records).await
    }

    /// Check the one record registered under `mailbox`.
    pub async fn run_single(
        &self,
        service: &str,
        mailbox: &str,
    ) -> Result<VerificationSummary, OrchestratorError> {
        let service_config = self.service_config(service)?;
        let record = self
            .store
            .fetch_by_mailbox(mailbox)
            .await?
            .ok_or_else(|| OrchestratorError::MailboxNotFound(mailbox.to_string()))?;

        info!(service, mailbox, "Checking single account");
        self.check_all(service, service_config, vec![record]).await
    }

    fn service_config(&self, service: &str) -> Result<&ServiceConfig, OrchestratorError> {
        self.services
            .get(service)
            .ok_or_else(|| OrchestratorError::MissingServiceConfig(service.to_string()))
    }

    async fn check_all(
        &self,
        service: &str,
        service_config: &ServiceConfig,
        records: Vec<AccountRecord>,
    ) -> Result<VerificationSummary, OrchestratorError> {
        let mut summary = VerificationSummary::new(service);
        let total = records.len();
        for (index, record) in records.iter().enumerate() {
            let record_outcome = self.check_record(service_config, record).await;
            metrics::VERIFICATION_OUTCOMES
                .with_label_values(&[service, record_outcome.status.as_str()])
                .inc();
            summary.push(record_outcome);

            if index + 1 < total {
                debug!(
                    delay_ms = self.config.inter_record_delay_ms,
                    "Pacing before next record"
                );
                tokio::time::sleep(self.config.inter_record_delay()).await;
            }
        }
        summary.checked_at = Utc::now();

        let name = format!(
            "{}_verification_{}.json",
            service,
            Utc::now().format("%Y-%m-%d")
        );
        let document =
            serde_json::to_value(&summary).map_err(|e| ArtifactError::encode(&name, e))?;
        let path = self.artifacts.save_summary(&name, &document).await?;

        info!(
            service,
            verified = summary.counts.verified,
            soon = summary.counts.soon,
            rejected = summary.counts.rejected,
            errors = summary.counts.errors,
            summary = %path.display(),
            "Verification run finished"
        );
        Ok(summary)
    }

    async fn check_record(
        &self,
        service_config: &ServiceConfig,
        record: &AccountRecord,
    ) -> RecordOutcome {
        debug!(account_id = %record.id, mailbox = %record.mailbox, "Checking account");

        let session = match self.driver.new_session().await {
            Ok(session) => session,
            Err(e) => {
                error!(account_id = %record.id, error = %e, "Could not open browser session");
                let comment = format!("verification failed: {e}");
                self.persist(record, AccountStatus::Error, &comment).await;
                return outcome(record, AccountStatus::Error, comment);
            }
        };

        let (status, comment) = match self
            .classify(service_config, record, session.as_ref())
            .await
        {
            Ok(classified) => classified,
            Err(e) => {
                warn!(account_id = %record.id, error = %e, "Verification check failed");
                (AccountStatus::Error, format!("verification failed: {e}"))
            }
        };

        // Evidence screenshot, regardless of how the check went.
        let name = format!("{}_{}.png", mailbox_slug(&record.mailbox), status.as_str());
        match session.screenshot().await {
            Ok(bytes) => {
                if let Err(e) = self.artifacts.save_screenshot(&name, &bytes).await {
                    warn!(account_id = %record.id, error = %e, "Failed to save verification screenshot");
                }
            }
            Err(e) => {
                warn!(account_id = %record.id, error = %e, "Failed to capture verification screenshot");
            }
        }

        if let Err(e) = session.close().await {
            warn!(account_id = %record.id, error = %e, "Failed to close browser session");
        }

        self.persist(record, status, &comment).await;
        info!(account_id = %record.id, mailbox = %record.mailbox, status = %status, "Account checked");
        outcome(record, status, comment)
    }

    /// Attempt the login and read the landing page.
    async fn classify(
        &self,
        service_config: &ServiceConfig,
        record: &AccountRecord,
        session: &dyn BrowserSession,
    ) -> Result<(AccountStatus, String), BrowserError> {
        session.goto(&service_config.login_url).await?;

        if !session.exists(EMAIL_SELECTOR).await? || !session.exists(PASSWORD_SELECTOR).await? {
            return Ok((AccountStatus::Error, "login fields not found".to_string()));
        }

        session.type_into(EMAIL_SELECTOR, &record.mailbox).await?;
        session
            .type_into(PASSWORD_SELECTOR, &self.config.fixed_password)
            .await?;
        session.press_enter(PASSWORD_SELECTOR).await?;
        tokio::time::sleep(service_config.settle_delay()).await;

        let url = session.current_url().await?;
        if url.to_lowercase().contains("login") {
            return Ok((
                AccountStatus::Error,
                "login rejected or blocked".to_string(),
            ));
        }
        if session.exists(&service_config.processing_selector).await? {
            return Ok((AccountStatus::Soon, "account pending review".to_string()));
        }
        if session.exists(&service_config.rejected_selector).await? {
            return Ok((
                AccountStatus::Rejected,
                "account rejected or blocked".to_string(),
            ));
        }
        Ok((AccountStatus::Verified, "account verified".to_string()))
    }

    /// Best-effort status write; a failure must not stop the run.
    async fn persist(&self, record: &AccountRecord, status: AccountStatus, comment: &str) {
        let update = StatusUpdate::new()
            .with_comment(comment)
            .with_checked_at(Utc::now());
        if let Err(e) = self.store.update_status(&record.id, status, update).await {
            warn!(account_id = %record.id, error = %e, "Failed to persist verification status");
        }
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

/// Artifact-safe form of a mailbox address.
fn mailbox_slug(mailbox: &str) -> String {
    mailbox.replace(['@', '.'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::account::AccountStoreError;
    use crate::testing::fixtures::{account_record, account_record_with};
    use crate::testing::{MockAccountStore, MockBrowserDriver, RecordingArtifactSink};

    struct Harness {
        store: Arc<MockAccountStore>,
        driver: Arc<MockBrowserDriver>,
        artifacts: Arc<RecordingArtifactSink>,
        verifier: VerificationOrchestrator,
    }

    fn harness() -> Harness {
        harness_with_delay(0)
    }

    fn harness_with_delay(inter_record_delay_ms: u64) -> Harness {
        let store = Arc::new(MockAccountStore::new());
        let driver = Arc::new(MockBrowserDriver::new());
        let artifacts = Arc::new(RecordingArtifactSink::new());

        let mut services = BTreeMap::new();
        services.insert(
            "demo".to_string(),
            ServiceConfig {
                login_url: "https://demo.test/login".to_string(),
                processing_selector: ".review-banner".to_string(),
                rejected_selector: ".rejected-banner".to_string(),
                settle_delay_ms: 0,
                signup_url: None,
            },
        );

        let config = OrchestratorConfig {
            inter_record_delay_ms,
            fixed_password: "s3cret".to_string(),
            ..OrchestratorConfig::default()
        };
        let verifier = VerificationOrchestrator::new(
            store.clone(),
            driver.clone(),
            artifacts.clone(),
            services,
            config,
        );

        Harness {
            store,
            driver,
            artifacts,
            verifier,
        }
    }

    /// Seed a pending record and make the login form present.
    fn seed_pending(h: &Harness) {
        let mut record = account_record("demo");
        record.status = AccountStatus::Pending;
        h.store.seed(vec![record]);
        h.driver.session().set_element(EMAIL_SELECTOR, true);
        h.driver.session().set_element(PASSWORD_SELECTOR, true);
    }

    #[tokio::test]
    async fn test_clean_landing_page_means_verified() {
        let h = harness();
        seed_pending(&h);
        h.driver.session().set_current_url("https://demo.test/home");

        let summary = h.verifier.run_batch("demo", AccountStatus::Pending).await.unwrap();

        assert_eq!(summary.counts.verified, 1);
        let session = h.driver.session();
        assert_eq!(session.visited(), vec!["https://demo.test/login"]);
        assert_eq!(
            session.typed(),
            vec![
                (EMAIL_SELECTOR.to_string(), "jean.dupont@demo.test".to_string()),
                (PASSWORD_SELECTOR.to_string(), "s3cret".to_string()),
            ]
        );
        assert_eq!(session.enter_presses(), vec![PASSWORD_SELECTOR]);
        assert!(session.closed());

        let changes = h.store.changes_for("acc-1");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].status, AccountStatus::Verified);
        assert_eq!(changes[0].comment.as_deref(), Some("account verified"));
        assert!(changes[0].checked_at.is_some());
    }

    #[tokio::test]
    async fn test_login_like_url_means_error() {
        let h = harness();
        seed_pending(&h);
        h.driver
            .session()
            .set_current_url("https://demo.test/LOGIN?failed=1");

        let summary = h.verifier.run_batch("demo", AccountStatus::Pending).await.unwrap();

        assert_eq!(summary.counts.errors, 1);
        let changes = h.store.changes_for("acc-1");
        assert_eq!(changes[0].status, AccountStatus::Error);
        assert_eq!(
            changes[0].comment.as_deref(),
            Some("login rejected or blocked")
        );
    }

    #[tokio::test]
    async fn test_processing_marker_means_soon() {
        let h = harness();
        seed_pending(&h);
        h.driver.session().set_current_url("https://demo.test/home");
        h.driver.session().set_element(".review-banner", true);
        // The processing marker wins even if the rejected one matches too.
        h.driver.session().set_element(".rejected-banner", true);

        let summary = h.verifier.run_batch("demo", AccountStatus::Pending).await.unwrap();

        assert_eq!(summary.counts.soon, 1);
        let changes = h.store.changes_for("acc-1");
        assert_eq!(changes[0].status, AccountStatus::Soon);
        assert_eq!(changes[0].comment.as_deref(), Some("account pending review"));
    }

    #[tokio::test]
    async fn test_rejected_marker_means_rejected() {
        let h = harness();
        seed_pending(&h);
        h.driver.session().set_current_url("https://demo.test/home");
        h.driver.session().set_element(".rejected-banner", true);

        let summary = h.verifier.run_batch("demo", AccountStatus::Pending).await.unwrap();

        assert_eq!(summary.counts.rejected, 1);
        let changes = h.store.changes_for("acc-1");
        assert_eq!(changes[0].status, AccountStatus::Rejected);
        assert_eq!(
            changes[0].comment.as_deref(),
            Some("account rejected or blocked")
        );
    }

    #[tokio::test]
    async fn test_missing_login_fields_mean_error_without_typing() {
        let h = harness();
        let mut record = account_record("demo");
        record.status = AccountStatus::Pending;
        h.store.seed(vec![record]);

        let summary = h.verifier.run_batch("demo", AccountStatus::Pending).await.unwrap();

        assert_eq!(summary.counts.errors, 1);
        assert!(h.driver.session().typed().is_empty());
        let changes = h.store.changes_for("acc-1");
        assert_eq!(changes[0].comment.as_deref(), Some("login fields not found"));
    }

    #[tokio::test]
    async fn test_screenshot_named_by_mailbox_and_classification() {
        let h = harness();
        seed_pending(&h);
        h.driver.session().set_current_url("https://demo.test/home");

        h.verifier.run_batch("demo", AccountStatus::Pending).await.unwrap();

        assert_eq!(
            h.artifacts.screenshot_names(),
            vec!["jean_dupont_demo_test_verified.png"]
        );
    }

    #[tokio::test]
    async fn test_navigation_failure_still_screenshots_and_closes() {
        let h = harness();
        seed_pending(&h);
        h.driver
            .session()
            .fail_next_goto(BrowserError::Timeout("page load".to_string()));

        let summary = h.verifier.run_batch("demo", AccountStatus::Pending).await.unwrap();

        assert_eq!(summary.counts.errors, 1);
        assert!(h.driver.session().closed());
        assert_eq!(
            h.artifacts.screenshot_names(),
            vec!["jean_dupont_demo_test_error.png"]
        );

        let changes = h.store.changes_for("acc-1");
        assert_eq!(
            changes[0].comment.as_deref(),
            Some("verification failed: Browser request timed out: page load")
        );
    }

    #[tokio::test]
    async fn test_single_mode_looks_up_by_mailbox() {
        let h = harness();
        seed_pending(&h);
        h.driver.session().set_current_url("https://demo.test/home");

        let summary = h
            .verifier
            .run_single("demo", "jean.dupont@demo.test")
            .await
            .unwrap();

        assert_eq!(summary.total(), 1);
        assert_eq!(summary.counts.verified, 1);
        // Single mode does not page through the store.
        assert!(h.store.fetches().is_empty());
    }

    #[tokio::test]
    async fn test_single_mode_unknown_mailbox_aborts() {
        let h = harness();
        let err = h
            .verifier
            .run_single("demo", "ghost@demo.test")
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::MailboxNotFound(m) if m == "ghost@demo.test"));
    }

    #[tokio::test]
    async fn test_unconfigured_service_aborts() {
        let h = harness();
        let err = h
            .verifier
            .run_batch("ghost", AccountStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::MissingServiceConfig(s) if s == "ghost"));
    }

    #[tokio::test]
    async fn test_batch_fetches_requested_status() {
        let h = harness();
        let mut record = account_record_with("acc-9", "soon@demo.test", "demo");
        record.status = AccountStatus::Soon;
        h.store.seed(vec![record]);
        h.driver.session().set_element(EMAIL_SELECTOR, true);
        h.driver.session().set_element(PASSWORD_SELECTOR, true);
        h.driver.session().set_current_url("https://demo.test/home");

        let summary = h.verifier.run_batch("demo", AccountStatus::Soon).await.unwrap();

        assert_eq!(summary.counts.verified, 1);
        let fetches = h.store.fetches();
        assert_eq!(fetches[0].1, AccountStatus::Soon);
    }

    #[tokio::test]
    async fn test_summary_artifact_written_with_counts() {
        let h = harness();
        seed_pending(&h);
        h.driver.session().set_current_url("https://demo.test/home");

        h.verifier.run_batch("demo", AccountStatus::Pending).await.unwrap();

        let summaries = h.artifacts.summaries();
        assert_eq!(summaries.len(), 1);
        let expected = format!("demo_verification_{}.json", Utc::now().format("%Y-%m-%d"));
        assert_eq!(summaries[0].0, expected);
        assert_eq!(summaries[0].1["counts"]["verified"], 1);
        assert_eq!(summaries[0].1["outcomes"][0]["status"], "verified");
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_the_run_going() {
        let h = harness();
        let mut first = account_record_with("acc-1", "first@demo.test", "demo");
        first.status = AccountStatus::Pending;
        let mut second = account_record_with("acc-2", "second@demo.test", "demo");
        second.status = AccountStatus::Pending;
        second.created_at = first.created_at + chrono::Duration::milliseconds(1);
        h.store.seed(vec![first, second]);
        h.driver.session().set_element(EMAIL_SELECTOR, true);
        h.driver.session().set_element(PASSWORD_SELECTOR, true);
        h.driver.session().set_current_url("https://demo.test/home");
        h.store.push_update_error(AccountStoreError::Api {
            status: 503,
            message: "unavailable".to_string(),
        });

        let summary = h.verifier.run_batch("demo", AccountStatus::Pending).await.unwrap();

        // Both records classified; only the second write landed.
        assert_eq!(summary.counts.verified, 2);
        assert_eq!(h.store.changes().len(), 1);
        assert_eq!(h.store.changes()[0].id, "acc-2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_between_records() {
        let h = harness_with_delay(10_000);
        let mut first = account_record_with("acc-1", "first@demo.test", "demo");
        first.status = AccountStatus::Pending;
        let mut second = account_record_with("acc-2", "second@demo.test", "demo");
        second.status = AccountStatus::Pending;
        second.created_at = first.created_at + chrono::Duration::milliseconds(1);
        h.store.seed(vec![first, second]);
        h.driver.session().set_element(EMAIL_SELECTOR, true);
        h.driver.session().set_element(PASSWORD_SELECTOR, true);
        h.driver.session().set_current_url("https://demo.test/home");

        let started = tokio::time::Instant::now();
        h.verifier.run_batch("demo", AccountStatus::Pending).await.unwrap();

        // One gap between two records, nothing after the last.
        assert_eq!(started.elapsed(), std::time::Duration::from_millis(10_000));
    }

    #[test]
    fn test_mailbox_slug() {
        assert_eq!(
            mailbox_slug("jean.dupont@demo.test"),
            "jean_dupont_demo_test"
        );
    }
}
