//! Testing utilities and mock implementations for E2E tests.
//!
//! This module provides mock implementations of all external service
//! traits, allowing full pipeline tests without a datastore, browser,
//! mailbox or captcha service behind them.
//!
//! # Example
//!
//! ```rust,ignore
//! use enroller_core::testing::{fixtures, MockAccountStore, MockBrowserDriver};
//!
//! let store = MockAccountStore::new();
//! store.seed(vec![fixtures::account_record("demo")]);
//!
//! let browser = MockBrowserDriver::new();
//! browser.session().set_element("input[type='email']", true);
//!
//! // Wire into an orchestrator...
//! ```

mod mock_artifact;
mod mock_browser;
mod mock_captcha;
mod mock_mailbox;
mod mock_store;
mod mock_workflow;

pub use mock_artifact::RecordingArtifactSink;
pub use mock_browser::{MockBrowserDriver, MockBrowserSession};
pub use mock_captcha::MockCaptchaApi;
pub use mock_mailbox::MockMailboxClient;
pub use mock_store::{MockAccountStore, StatusChange};
pub use mock_workflow::MockWorkflow;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{Duration, NaiveDate, Utc};

    use crate::account::{AccountRecord, AccountStatus};

    /// Create a complete test record with reasonable defaults.
    pub fn account_record(service: &str) -> AccountRecord {
        account_record_with("acc-1", "jean.dupont@demo.test", service)
    }

    /// Create a complete test record with explicit identifiers.
    pub fn account_record_with(id: &str, mailbox: &str, service: &str) -> AccountRecord {
        AccountRecord {
            id: id.to_string(),
            given_name: "Jean".to_string(),
            family_name: "Dupont".to_string(),
            sex: "M".to_string(),
            birth_date: Some(NaiveDate::from_ymd_opt(1990, 4, 12).unwrap()),
            birth_place: "Lyon".to_string(),
            address: "12 rue de la Republique".to_string(),
            city: "Lyon".to_string(),
            postal_code: "69002".to_string(),
            phone: Some("0699887766".to_string()),
            mailbox: mailbox.to_string(),
            service: service.to_string(),
            status: AccountStatus::New,
            comment: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Create `n` records with distinct ids, mailboxes and ascending
    /// creation times, so fetch order is deterministic.
    pub fn account_batch(n: usize, service: &str) -> Vec<AccountRecord> {
        let base = Utc::now();
        (1..=n)
            .map(|i| {
                let mut record = account_record_with(
                    &format!("acc-{i}"),
                    &format!("jean.dupont{i}@demo.test"),
                    service,
                );
                record.created_at = base + Duration::milliseconds(i as i64);
                record.updated_at = record.created_at;
                record
            })
            .collect()
    }
}
