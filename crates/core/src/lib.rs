pub mod account;
pub mod artifact;
pub mod browser;
pub mod captcha;
pub mod config;
pub mod mailbox;
pub mod metrics;
pub mod orchestrator;
pub mod testing;
pub mod validation;
pub mod workflow;

pub use account::{
    AccountRecord, AccountStatus, AccountStore, AccountStoreError, RestAccountStore, StatusUpdate,
};
pub use artifact::{ArtifactError, ArtifactSink, FsArtifactSink};
pub use browser::{BrowserDriver, BrowserError, BrowserSession, WebDriverBrowser};
pub use captcha::{
    find_site_key, CaptchaApi, CaptchaChallenge, CaptchaError, CaptchaSolver, HttpCaptchaClient,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, OrchestratorConfig,
    SanitizedConfig, ServiceConfig,
};
pub use mailbox::{HttpMailboxClient, MailMessage, MailboxClient, OtpError, OtpRetriever};
pub use orchestrator::{
    AccountLifecycleOrchestrator, BatchResult, OrchestratorError, RecordOutcome,
    VerificationOrchestrator, VerificationSummary,
};
pub use validation::{ValidationGate, ValidationReport};
pub use workflow::{
    PreparedAccount, Workflow, WorkflowError, WorkflowOutcome, WorkflowRegistry, WorkflowRunner,
};
