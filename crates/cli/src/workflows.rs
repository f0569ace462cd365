//! Registration workflows shipped with the binary.
//!
//! The core crate keeps per-service registration scripts behind the
//! [`Workflow`] trait. This module provides one generic implementation
//! driving a conventional signup form with the page knowledge from
//! `[services.<name>]`; services with a flow the form workflow cannot
//! express get their own `Workflow` type here instead.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use enroller_core::{
    find_site_key, AccountRecord, BrowserSession, CaptchaChallenge, CaptchaSolver, Config,
    OtpRetriever, PreparedAccount, ServiceConfig, Workflow, WorkflowError, WorkflowRegistry,
};

const GIVEN_NAME_SELECTOR: &str = "input[name='firstname']";
const FAMILY_NAME_SELECTOR: &str = "input[name='lastname']";
const EMAIL_SELECTOR: &str = "input[name='email']";
const PASSWORD_SELECTOR: &str = "input[name='password']";
const PHONE_SELECTOR: &str = "input[name='phone']";
const BIRTH_DATE_SELECTOR: &str = "input[name='birthdate']";
const ADDRESS_SELECTOR: &str = "input[name='address']";
const CITY_SELECTOR: &str = "input[name='city']";
const POSTAL_CODE_SELECTOR: &str = "input[name='zip']";
const IMAGE_SELECTOR: &str = "input[type='file']";
const CAPTCHA_RESPONSE_SELECTOR: &str = "textarea[name='g-recaptcha-response']";
const OTP_SELECTOR: &str = "input[name='code']";

/// Build the workflow registry from the configured services.
///
/// Every `[services.<name>]` entry gets a [`FormWorkflow`]; entries
/// without a `signup_url` stay registered so a registration run against
/// them fails with a message naming the missing key instead of
/// "unknown service".
pub fn build_registry(
    config: &Config,
    captcha: Arc<CaptchaSolver>,
    otp: Arc<OtpRetriever>,
) -> WorkflowRegistry {
    let mut registry = WorkflowRegistry::new();
    for (service, service_config) in &config.services {
        registry.register(Arc::new(FormWorkflow::new(
            service.clone(),
            service_config.clone(),
            Arc::clone(&captcha),
            Arc::clone(&otp),
            config.browser.user_agent.clone(),
        )));
    }
    registry
}

/// Drives a conventional signup form.
///
/// The page contract: identity fields named `firstname`, `lastname`,
/// `email`, `password`, `phone`, `birthdate`, `address`, `city` and
/// `zip`; optionally a file input for the identity image, a reCAPTCHA
/// widget and a mailed-code prompt named `code`. Submission is Enter in
/// the password field. After each submit the page settles for the
/// configured delay before the rejection banner is checked.
pub struct FormWorkflow {
    service: String,
    config: ServiceConfig,
    captcha: Arc<CaptchaSolver>,
    otp: Arc<OtpRetriever>,
    user_agent: Option<String>,
}

impl FormWorkflow {
    pub fn new(
        service: impl Into<String>,
        config: ServiceConfig,
        captcha: Arc<CaptchaSolver>,
        otp: Arc<OtpRetriever>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            service: service.into(),
            config,
            captcha,
            otp,
            user_agent,
        }
    }

    /// Solve the page's reCAPTCHA, when it carries one, and drop the
    /// token into the response textarea the widget reads on submit.
    async fn solve_captcha_if_present(
        &self,
        session: &dyn BrowserSession,
    ) -> Result<(), WorkflowError> {
        let html = session.page_source().await?;
        let Some(site_key) = find_site_key(&html) else {
            return Ok(());
        };

        debug!(service = %self.service, "Captcha detected on signup page");
        let page_url = session.current_url().await?;
        let mut challenge = CaptchaChallenge::new(page_url, site_key);
        if let Some(user_agent) = &self.user_agent {
            challenge = challenge.with_user_agent(user_agent.clone());
        }

        let token = self.captcha.solve(&challenge).await?;
        session.type_into(CAPTCHA_RESPONSE_SELECTOR, &token).await?;
        Ok(())
    }

    async fn check_rejection(&self, session: &dyn BrowserSession) -> Result<(), WorkflowError> {
        if session.exists(&self.config.rejected_selector).await? {
            return Err(WorkflowError::Rejected(
                "rejection banner shown after submit".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Workflow for FormWorkflow {
    fn service(&self) -> &str {
        &self.service
    }

    async fn run(
        &self,
        session: &dyn BrowserSession,
        record: &AccountRecord,
        prepared: &PreparedAccount,
    ) -> Result<(), WorkflowError> {
        let signup_url = self.config.signup_url.as_deref().ok_or_else(|| {
            WorkflowError::Other(format!(
                "no signup_url configured for service: {}",
                self.service
            ))
        })?;

        session.goto(signup_url).await?;
        debug!(service = %self.service, mailbox = %record.mailbox, "Filling signup form");

        let fields = [
            (GIVEN_NAME_SELECTOR, prepared.given_name.as_str()),
            (FAMILY_NAME_SELECTOR, prepared.family_name.as_str()),
            (EMAIL_SELECTOR, prepared.mailbox.as_str()),
            (PASSWORD_SELECTOR, prepared.password.as_str()),
            (PHONE_SELECTOR, prepared.phone.as_str()),
            (BIRTH_DATE_SELECTOR, prepared.birth_date.as_str()),
            (ADDRESS_SELECTOR, prepared.address.as_str()),
            (CITY_SELECTOR, prepared.city.as_str()),
            (POSTAL_CODE_SELECTOR, prepared.postal_code.as_str()),
        ];
        for (selector, value) in fields {
            session.type_into(selector, value).await?;
        }

        // WebDriver uploads files by sending the local path as keys to
        // the file input.
        if session.exists(IMAGE_SELECTOR).await? {
            session
                .type_into(IMAGE_SELECTOR, &prepared.image_path.to_string_lossy())
                .await?;
        }

        self.solve_captcha_if_present(session).await?;

        debug!(service = %self.service, "Submitting signup form");
        session.press_enter(PASSWORD_SELECTOR).await?;
        tokio::time::sleep(self.config.settle_delay()).await;
        self.check_rejection(session).await?;

        if session.exists(OTP_SELECTOR).await? {
            let code = self.otp.retrieve_code(&prepared.mailbox).await?;
            debug!(service = %self.service, "Entering mailed verification code");
            session.type_into(OTP_SELECTOR, &code).await?;
            session.press_enter(OTP_SELECTOR).await?;
            tokio::time::sleep(self.config.settle_delay()).await;
            self.check_rejection(session).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;
    use std::time::Duration;

    use enroller_core::captcha::TaskPoll;
    use enroller_core::testing::{fixtures, MockBrowserSession, MockCaptchaApi, MockMailboxClient};
    use enroller_core::{load_config_from_str, MailMessage};

    fn service_config(signup_url: Option<&str>) -> ServiceConfig {
        ServiceConfig {
            login_url: "https://demo.test/login".to_string(),
            processing_selector: ".review-banner".to_string(),
            rejected_selector: ".rejected-banner".to_string(),
            settle_delay_ms: 0,
            signup_url: signup_url.map(str::to_string),
        }
    }

    struct Harness {
        workflow: FormWorkflow,
        session: MockBrowserSession,
        captcha_api: Arc<MockCaptchaApi>,
        mailbox: Arc<MockMailboxClient>,
    }

    fn harness(signup_url: Option<&str>) -> Harness {
        let captcha_api = Arc::new(MockCaptchaApi::new());
        let mailbox = Arc::new(MockMailboxClient::new());
        let captcha = Arc::new(CaptchaSolver::new(
            captcha_api.clone(),
            Duration::from_secs(5),
            Duration::ZERO,
        ));
        let otp = Arc::new(OtpRetriever::new(mailbox.clone(), 3, Duration::ZERO));
        Harness {
            workflow: FormWorkflow::new("demo", service_config(signup_url), captcha, otp, None),
            session: MockBrowserSession::new(),
            captcha_api,
            mailbox,
        }
    }

    fn mark_form_fields(session: &MockBrowserSession) {
        for selector in [
            GIVEN_NAME_SELECTOR,
            FAMILY_NAME_SELECTOR,
            EMAIL_SELECTOR,
            PASSWORD_SELECTOR,
            PHONE_SELECTOR,
            BIRTH_DATE_SELECTOR,
            ADDRESS_SELECTOR,
            CITY_SELECTOR,
            POSTAL_CODE_SELECTOR,
        ] {
            session.set_element(selector, true);
        }
    }

    fn prepared() -> (AccountRecord, PreparedAccount) {
        let record = fixtures::account_record("demo");
        let prepared = PreparedAccount::from_record(
            &record,
            PathBuf::from("/assets/identity/jean-dupont.jpg"),
            "s3cret",
        );
        (record, prepared)
    }

    #[tokio::test]
    async fn test_fills_form_and_submits() {
        let h = harness(Some("https://demo.test/signup"));
        mark_form_fields(&h.session);
        let (record, prepared) = prepared();

        h.workflow.run(&h.session, &record, &prepared).await.unwrap();

        assert_eq!(h.session.visited(), vec!["https://demo.test/signup"]);
        let typed = h.session.typed();
        assert!(typed.contains(&(EMAIL_SELECTOR.to_string(), record.mailbox.clone())));
        assert!(typed.contains(&(PASSWORD_SELECTOR.to_string(), "s3cret".to_string())));
        assert!(typed.contains(&(POSTAL_CODE_SELECTOR.to_string(), "69002".to_string())));
        assert_eq!(h.session.enter_presses(), vec![PASSWORD_SELECTOR]);
        assert_eq!(h.captcha_api.create_calls(), 0);
        assert_eq!(h.mailbox.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_signup_url_fails_before_navigation() {
        let h = harness(None);
        let (record, prepared) = prepared();

        let err = h
            .workflow
            .run(&h.session, &record, &prepared)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "no signup_url configured for service: demo");
        assert!(h.session.visited().is_empty());
    }

    #[tokio::test]
    async fn test_identity_image_path_sent_to_file_input() {
        let h = harness(Some("https://demo.test/signup"));
        mark_form_fields(&h.session);
        h.session.set_element(IMAGE_SELECTOR, true);
        let (record, prepared) = prepared();

        h.workflow.run(&h.session, &record, &prepared).await.unwrap();

        assert!(h.session.typed().contains(&(
            IMAGE_SELECTOR.to_string(),
            "/assets/identity/jean-dupont.jpg".to_string()
        )));
    }

    #[tokio::test]
    async fn test_captcha_token_typed_when_site_key_found() {
        let h = harness(Some("https://demo.test/signup"));
        mark_form_fields(&h.session);
        h.session.set_element(CAPTCHA_RESPONSE_SELECTOR, true);
        h.session
            .set_page_source(r#"<div class="g-recaptcha" data-sitekey="6LdKey-demo"></div>"#);
        h.captcha_api.push_poll(Ok(TaskPoll::Ready {
            token: "tok-demo-1".to_string(),
        }));
        let (record, prepared) = prepared();

        h.workflow.run(&h.session, &record, &prepared).await.unwrap();

        assert_eq!(h.captcha_api.create_calls(), 1);
        assert!(h.session.typed().contains(&(
            CAPTCHA_RESPONSE_SELECTOR.to_string(),
            "tok-demo-1".to_string()
        )));
    }

    #[tokio::test]
    async fn test_rejection_banner_after_submit_fails_the_record() {
        let h = harness(Some("https://demo.test/signup"));
        mark_form_fields(&h.session);
        h.session.set_element(".rejected-banner", true);
        let (record, prepared) = prepared();

        let err = h
            .workflow
            .run(&h.session, &record, &prepared)
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "registration rejected: rejection banner shown after submit"
        );
        assert_eq!(h.mailbox.calls(), 0);
    }

    #[tokio::test]
    async fn test_mailed_code_typed_when_prompt_appears() {
        let h = harness(Some("https://demo.test/signup"));
        mark_form_fields(&h.session);
        h.session.set_element(OTP_SELECTOR, true);
        h.mailbox.push_messages(vec![MailMessage {
            mail_text_only: "Your verification code is 482913.".to_string(),
            ..Default::default()
        }]);
        let (record, prepared) = prepared();

        h.workflow.run(&h.session, &record, &prepared).await.unwrap();

        assert_eq!(h.mailbox.calls(), 1);
        assert!(h
            .session
            .typed()
            .contains(&(OTP_SELECTOR.to_string(), "482913".to_string())));
        assert_eq!(h.session.enter_presses(), vec![PASSWORD_SELECTOR, OTP_SELECTOR]);
    }

    #[tokio::test]
    async fn test_missing_form_field_surfaces_as_browser_error() {
        let h = harness(Some("https://demo.test/signup"));
        let (record, prepared) = prepared();

        let err = h
            .workflow
            .run(&h.session, &record, &prepared)
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "browser error: Element not found: input[name='firstname']"
        );
    }

    #[test]
    fn test_registry_covers_configured_services() {
        let toml = r#"
[datastore]
url = "https://db.demo.test/rest/v1"
api_key = "db-key"

[mailbox]
url = "https://mail.demo.test"
api_key = "mail-key"

[captcha]
url = "https://captcha.demo.test"
client_key = "captcha-key"

[services.demo]
login_url = "https://demo.test/login"
processing_selector = ".review-banner"
rejected_selector = ".rejected-banner"
signup_url = "https://demo.test/signup"

[services.other]
login_url = "https://other.test/login"
processing_selector = ".pending"
rejected_selector = ".blocked"
"#;
        let config = load_config_from_str(toml).unwrap();
        let captcha_api = Arc::new(MockCaptchaApi::new());
        let mailbox = Arc::new(MockMailboxClient::new());
        let captcha = Arc::new(CaptchaSolver::new(
            captcha_api,
            Duration::from_secs(5),
            Duration::ZERO,
        ));
        let otp = Arc::new(OtpRetriever::new(mailbox, 3, Duration::ZERO));

        let registry = build_registry(&config, captcha, otp);

        let mut services = registry.services();
        services.sort();
        assert_eq!(services, vec!["demo", "other"]);
    }
}
