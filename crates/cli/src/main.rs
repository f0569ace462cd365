mod commands;
mod workflows;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sha2::{Digest, Sha256};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use enroller_core::{
    load_config, validate_config, AccountLifecycleOrchestrator, AccountStatus, AccountStore,
    ArtifactSink, BrowserDriver, CaptchaApi, CaptchaSolver, FsArtifactSink, HttpCaptchaClient,
    HttpMailboxClient, MailboxClient, OtpRetriever, RestAccountStore, SanitizedConfig,
    ValidationGate, VerificationOrchestrator, WebDriverBrowser, WorkflowRunner,
};

use crate::commands::{Cli, Command};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting enroller v{}", VERSION);

    let config_path = std::env::var("ENROLLER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // The display command works on configs that would fail validation;
    // that is what it is for.
    if let Command::ShowConfig = cli.command {
        let rendered = serde_json::to_string_pretty(&SanitizedConfig::from(&config))
            .context("Failed to render configuration")?;
        println!("{rendered}");
        return Ok(());
    }

    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).context("Failed to serialize config")?;
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        path = %config_path.display(),
        fingerprint = %&config_hash[..16],
        "Configuration loaded"
    );

    let metrics = prometheus::Registry::new();
    for metric in enroller_core::metrics::all_metrics() {
        metrics
            .register(metric)
            .context("Failed to register metric")?;
    }

    let store: Arc<dyn AccountStore> = Arc::new(RestAccountStore::new(config.datastore.clone()));
    info!(
        url = %config.datastore.url,
        table = %config.datastore.table,
        "Account datastore client ready"
    );

    let driver: Arc<dyn BrowserDriver> = Arc::new(WebDriverBrowser::new(config.browser.clone()));
    info!(
        url = %config.browser.url,
        browser = %config.browser.browser_name,
        headless = config.browser.headless,
        "WebDriver client ready"
    );

    let artifacts: Arc<dyn ArtifactSink> = Arc::new(FsArtifactSink::new(
        config.artifacts.screenshot_dir.clone(),
        config.artifacts.summary_dir.clone(),
    ));

    match cli.command {
        Command::Register { service } => {
            let mailbox_client: Arc<dyn MailboxClient> =
                Arc::new(HttpMailboxClient::new(config.mailbox.clone()));
            let otp = Arc::new(OtpRetriever::new(
                mailbox_client,
                config.orchestrator.otp_max_attempts,
                config.orchestrator.otp_retry_delay(),
            ));

            let captcha_api: Arc<dyn CaptchaApi> =
                Arc::new(HttpCaptchaClient::new(config.captcha.clone()));
            let captcha = Arc::new(CaptchaSolver::new(
                captcha_api,
                config.orchestrator.captcha_timeout(),
                config.orchestrator.captcha_poll_interval(),
            ));

            let registry = Arc::new(workflows::build_registry(&config, captcha, otp));
            info!(services = ?registry.services(), "Workflow registry ready");

            let gate = ValidationGate::new(config.assets.image_dir.clone());
            let runner = WorkflowRunner::new(
                Arc::clone(&driver),
                Arc::clone(&artifacts),
                config.orchestrator.fixed_password.clone(),
            );
            let orchestrator = AccountLifecycleOrchestrator::new(
                Arc::clone(&store),
                registry,
                gate,
                runner,
                Arc::clone(&artifacts),
                config.orchestrator.clone(),
            );
            orchestrator.run(&service).await?;
        }
        Command::Verify { service, target } => {
            let verifier = VerificationOrchestrator::new(
                Arc::clone(&store),
                Arc::clone(&driver),
                Arc::clone(&artifacts),
                config.services.clone(),
                config.orchestrator.clone(),
            );
            match target {
                Some(target) if target.contains('@') => {
                    verifier.run_single(&service, &target).await?;
                }
                Some(target) => {
                    let status: AccountStatus = target.parse()?;
                    verifier.run_batch(&service, status).await?;
                }
                None => {
                    verifier.run_batch(&service, AccountStatus::Pending).await?;
                }
            }
        }
        // Handled before validation.
        Command::ShowConfig => {}
    }

    let snapshot_path = write_metrics_snapshot(&metrics, &config.artifacts.summary_dir)
        .await
        .context("Failed to write metrics snapshot")?;
    info!(path = %snapshot_path.display(), "Metrics snapshot written");

    Ok(())
}

/// Dump the run's counters next to the summary artifacts, in the
/// Prometheus text format.
async fn write_metrics_snapshot(
    registry: &prometheus::Registry,
    dir: &Path,
) -> Result<PathBuf> {
    let encoder = prometheus::TextEncoder::new();
    let rendered = encoder.encode_to_string(&registry.gather())?;
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join("metrics.prom");
    tokio::fs::write(&path, rendered).await?;
    Ok(path)
}
