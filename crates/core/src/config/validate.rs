use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Required sections exist (enforced by serde)
/// - Endpoint URLs and keys are non-empty
/// - The fixed password is configured
/// - Timing values and limits are non-zero
/// - Service entries carry a login URL and both selectors
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    fn require(value: &str, name: &str) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{name} cannot be empty"
            )));
        }
        Ok(())
    }

    require(&config.datastore.url, "datastore.url")?;
    require(&config.datastore.api_key, "datastore.api_key")?;
    require(&config.datastore.table, "datastore.table")?;
    require(&config.mailbox.url, "mailbox.url")?;
    require(&config.mailbox.api_key, "mailbox.api_key")?;
    require(&config.captcha.url, "captcha.url")?;
    require(&config.captcha.client_key, "captcha.client_key")?;
    require(&config.browser.url, "browser.url")?;
    require(
        &config.orchestrator.fixed_password,
        "orchestrator.fixed_password",
    )?;

    let orchestrator = &config.orchestrator;
    let nonzero: [(u64, &str); 4] = [
        (orchestrator.inter_record_delay_ms, "orchestrator.inter_record_delay_ms"),
        (orchestrator.otp_retry_delay_ms, "orchestrator.otp_retry_delay_ms"),
        (orchestrator.captcha_timeout_ms, "orchestrator.captcha_timeout_ms"),
        (
            orchestrator.captcha_poll_interval_ms,
            "orchestrator.captcha_poll_interval_ms",
        ),
    ];
    for (value, name) in nonzero {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!(
                "{name} cannot be 0"
            )));
        }
    }
    if orchestrator.otp_max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.otp_max_attempts cannot be 0".to_string(),
        ));
    }
    if orchestrator.batch_limit == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.batch_limit cannot be 0".to_string(),
        ));
    }

    for (name, service) in &config.services {
        require(&service.login_url, &format!("services.{name}.login_url"))?;
        require(
            &service.processing_selector,
            &format!("services.{name}.processing_selector"),
        )?;
        require(
            &service.rejected_selector,
            &format!("services.{name}.rejected_selector"),
        )?;
    }

    Ok(())
}
