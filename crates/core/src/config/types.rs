use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub datastore: DatastoreConfig,
    pub mailbox: MailboxConfig,
    pub captcha: CaptchaConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Per-service page knowledge, keyed by service name.
    #[serde(default)]
    pub services: BTreeMap<String, ServiceConfig>,
}

/// Account datastore (PostgREST-style API) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatastoreConfig {
    /// Base URL of the REST API (e.g., "https://db.example.com/rest/v1")
    pub url: String,
    /// API key, sent as both `apikey` and bearer token
    pub api_key: String,
    /// Table holding the account records (default: "accounts")
    #[serde(default = "default_table")]
    pub table: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

fn default_table() -> String {
    "accounts".to_string()
}

fn default_http_timeout() -> u64 {
    30
}

/// Disposable-mailbox provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailboxConfig {
    /// Base URL of the mailbox API
    pub url: String,
    /// API key for the mailbox API
    pub api_key: String,
    /// Header the API key travels in (default: "x-api-key")
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

fn default_api_key_header() -> String {
    "x-api-key".to_string()
}

/// Captcha-solving service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptchaConfig {
    /// Base URL of the createTask/getTaskResult API
    pub url: String,
    /// Account key for the solving service
    pub client_key: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

/// WebDriver endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserConfig {
    /// WebDriver endpoint (default: "http://localhost:9515")
    #[serde(default = "default_webdriver_url")]
    pub url: String,
    /// Browser to request in capabilities (default: "chrome")
    #[serde(default = "default_browser_name")]
    pub browser_name: String,
    /// Run the browser headless (default: true)
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// Request timeout in seconds; page loads count against it
    /// (default: 60)
    #[serde(default = "default_browser_timeout")]
    pub timeout_secs: u64,
    /// User agent handed to captcha solving, when the target checks it
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            url: default_webdriver_url(),
            browser_name: default_browser_name(),
            headless: default_headless(),
            timeout_secs: default_browser_timeout(),
            user_agent: None,
        }
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_browser_name() -> String {
    "chrome".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_browser_timeout() -> u64 {
    60
}

/// Local asset directories
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetsConfig {
    /// Directory holding identity images, named `{given}-{family}.jpg`
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            image_dir: default_image_dir(),
        }
    }
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("assets/identity")
}

/// Run artifact directories
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtifactsConfig {
    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: PathBuf,
    #[serde(default = "default_summary_dir")]
    pub summary_dir: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            screenshot_dir: default_screenshot_dir(),
            summary_dir: default_summary_dir(),
        }
    }
}

fn default_screenshot_dir() -> PathBuf {
    PathBuf::from("artifacts/screenshots")
}

fn default_summary_dir() -> PathBuf {
    PathBuf::from("artifacts/summaries")
}

/// Batch-run tuning knobs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrchestratorConfig {
    /// Fixed delay between records that reached the workflow stage, in
    /// milliseconds (default: 10000)
    #[serde(default = "default_inter_record_delay_ms")]
    pub inter_record_delay_ms: u64,
    /// Mailbox queries per verification code before giving up
    /// (default: 3)
    #[serde(default = "default_otp_max_attempts")]
    pub otp_max_attempts: u32,
    /// Delay between mailbox queries, in milliseconds (default: 6000)
    #[serde(default = "default_otp_retry_delay_ms")]
    pub otp_retry_delay_ms: u64,
    /// Overall captcha solve deadline, in milliseconds
    /// (default: 120000)
    #[serde(default = "default_captcha_timeout_ms")]
    pub captcha_timeout_ms: u64,
    /// Delay between captcha task polls, in milliseconds
    /// (default: 3000)
    #[serde(default = "default_captcha_poll_interval_ms")]
    pub captcha_poll_interval_ms: u64,
    /// Maximum records fetched per batch (default: 100)
    #[serde(default = "default_batch_limit")]
    pub batch_limit: u32,
    /// Password set on every created account. Must be configured; there
    /// is no built-in value.
    #[serde(default)]
    pub fixed_password: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            inter_record_delay_ms: default_inter_record_delay_ms(),
            otp_max_attempts: default_otp_max_attempts(),
            otp_retry_delay_ms: default_otp_retry_delay_ms(),
            captcha_timeout_ms: default_captcha_timeout_ms(),
            captcha_poll_interval_ms: default_captcha_poll_interval_ms(),
            batch_limit: default_batch_limit(),
            fixed_password: String::new(),
        }
    }
}

impl OrchestratorConfig {
    pub fn inter_record_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.inter_record_delay_ms)
    }

    pub fn otp_retry_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.otp_retry_delay_ms)
    }

    pub fn captcha_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.captcha_timeout_ms)
    }

    pub fn captcha_poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.captcha_poll_interval_ms)
    }
}

fn default_inter_record_delay_ms() -> u64 {
    10000
}

fn default_otp_max_attempts() -> u32 {
    3
}

fn default_otp_retry_delay_ms() -> u64 {
    6000
}

fn default_captcha_timeout_ms() -> u64 {
    120000
}

fn default_captcha_poll_interval_ms() -> u64 {
    3000
}

fn default_batch_limit() -> u32 {
    100
}

/// Page knowledge for one target service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Login page used by verification
    pub login_url: String,
    /// Selector present while the account is still under review
    pub processing_selector: String,
    /// Selector present when the account was rejected or blocked
    pub rejected_selector: String,
    /// Wait after login submit before classifying, in milliseconds
    /// (default: 9000)
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Signup entry page, for workflows that read it from config
    #[serde(default)]
    pub signup_url: Option<String>,
}

impl ServiceConfig {
    pub fn settle_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.settle_delay_ms)
    }
}

fn default_settle_delay_ms() -> u64 {
    9000
}

/// Sanitized config for display (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub datastore: SanitizedDatastoreConfig,
    pub mailbox: SanitizedMailboxConfig,
    pub captcha: SanitizedCaptchaConfig,
    pub browser: BrowserConfig,
    pub assets: AssetsConfig,
    pub artifacts: ArtifactsConfig,
    pub orchestrator: SanitizedOrchestratorConfig,
    pub services: BTreeMap<String, ServiceConfig>,
}

/// Sanitized datastore config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDatastoreConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub table: String,
    pub timeout_secs: u64,
}

/// Sanitized mailbox config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedMailboxConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub api_key_header: String,
    pub timeout_secs: u64,
}

/// Sanitized captcha config (client key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCaptchaConfig {
    pub url: String,
    pub client_key_configured: bool,
    pub timeout_secs: u64,
}

/// Sanitized orchestrator config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedOrchestratorConfig {
    pub inter_record_delay_ms: u64,
    pub otp_max_attempts: u32,
    pub otp_retry_delay_ms: u64,
    pub captcha_timeout_ms: u64,
    pub captcha_poll_interval_ms: u64,
    pub batch_limit: u32,
    pub fixed_password_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            datastore: SanitizedDatastoreConfig {
                url: config.datastore.url.clone(),
                api_key_configured: !config.datastore.api_key.is_empty(),
                table: config.datastore.table.clone(),
                timeout_secs: config.datastore.timeout_secs,
            },
            mailbox: SanitizedMailboxConfig {
                url: config.mailbox.url.clone(),
                api_key_configured: !config.mailbox.api_key.is_empty(),
                api_key_header: config.mailbox.api_key_header.clone(),
                timeout_secs: config.mailbox.timeout_secs,
            },
            captcha: SanitizedCaptchaConfig {
                url: config.captcha.url.clone(),
                client_key_configured: !config.captcha.client_key.is_empty(),
                timeout_secs: config.captcha.timeout_secs,
            },
            browser: config.browser.clone(),
            assets: config.assets.clone(),
            artifacts: config.artifacts.clone(),
            orchestrator: SanitizedOrchestratorConfig {
                inter_record_delay_ms: config.orchestrator.inter_record_delay_ms,
                otp_max_attempts: config.orchestrator.otp_max_attempts,
                otp_retry_delay_ms: config.orchestrator.otp_retry_delay_ms,
                captcha_timeout_ms: config.orchestrator.captcha_timeout_ms,
                captcha_poll_interval_ms: config.orchestrator.captcha_poll_interval_ms,
                batch_limit: config.orchestrator.batch_limit,
                fixed_password_configured: !config.orchestrator.fixed_password.is_empty(),
            },
            services: config.services.clone(),
        }
    }
}
