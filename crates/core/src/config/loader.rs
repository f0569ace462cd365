use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides.
///
/// Environment variables use the `ENROLLER_` prefix with `__` as the
/// section separator, e.g. `ENROLLER_DATASTORE__API_KEY` overrides
/// `datastore.api_key`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("ENROLLER_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
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

[orchestrator]
fixed_password = "pw"
batch_limit = 25
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.orchestrator.batch_limit, 25);
        assert_eq!(config.orchestrator.fixed_password, "pw");
    }

    #[test]
    fn test_load_config_from_str_missing_captcha() {
        let toml = r#"
[datastore]
url = "https://db.demo.test/rest/v1"
api_key = "db-key"

[mailbox]
url = "https://mail.demo.test"
api_key = "mail-key"
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[datastore]
url = "https://db.demo.test/rest/v1"
api_key = "db-key"
table = "prospects"

[mailbox]
url = "https://mail.demo.test"
api_key = "mail-key"

[captcha]
url = "https://captcha.demo.test"
client_key = "captcha-key"

[services.demo]
login_url = "https://demo.test/login"
processing_selector = ".processing"
rejected_selector = ".rejected"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.datastore.table, "prospects");
        assert!(config.services.contains_key("demo"));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[datastore]
url = "https://db.demo.test/rest/v1"
api_key = "db-key"

[mailbox]
url = "https://mail.demo.test"
api_key = "mail-key"

[captcha]
url = "https://captcha.demo.test"
client_key = "captcha-key"

[orchestrator]
batch_limit = 25
"#
        )
        .unwrap();

        std::env::set_var("ENROLLER_ORCHESTRATOR__BATCH_LIMIT", "7");
        let config = load_config(temp_file.path());
        std::env::remove_var("ENROLLER_ORCHESTRATOR__BATCH_LIMIT");

        assert_eq!(config.unwrap().orchestrator.batch_limit, 7);
    }
}
