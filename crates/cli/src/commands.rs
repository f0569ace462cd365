//! Command-line surface.

use clap::{Parser, Subcommand};

/// Batch account registration and verification driver.
#[derive(Debug, Parser)]
#[command(name = "enroller", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register accounts for every new record of a service.
    Register {
        /// Service name, as stored on the records.
        service: String,
    },
    /// Log in to created accounts and record what the service did with
    /// them.
    Verify {
        /// Service name, as stored on the records.
        service: String,
        /// A mailbox (checks that one account) or a status selecting
        /// the batch. Defaults to the pending batch.
        target: Option<String>,
    },
    /// Print the effective configuration, secrets redacted.
    ShowConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_parses_service() {
        let cli = Cli::try_parse_from(["enroller", "register", "demo"]).unwrap();
        match cli.command {
            Command::Register { service } => assert_eq!(service, "demo"),
            other => panic!("Expected Register, got: {other:?}"),
        }
    }

    #[test]
    fn test_register_requires_service() {
        assert!(Cli::try_parse_from(["enroller", "register"]).is_err());
    }

    #[test]
    fn test_verify_target_is_optional() {
        let cli = Cli::try_parse_from(["enroller", "verify", "demo"]).unwrap();
        match cli.command {
            Command::Verify { service, target } => {
                assert_eq!(service, "demo");
                assert!(target.is_none());
            }
            other => panic!("Expected Verify, got: {other:?}"),
        }

        let cli =
            Cli::try_parse_from(["enroller", "verify", "demo", "jean.dupont@demo.test"]).unwrap();
        match cli.command {
            Command::Verify { target, .. } => {
                assert_eq!(target.as_deref(), Some("jean.dupont@demo.test"));
            }
            other => panic!("Expected Verify, got: {other:?}"),
        }
    }

    #[test]
    fn test_show_config_takes_no_arguments() {
        assert!(Cli::try_parse_from(["enroller", "show-config"]).is_ok());
        assert!(Cli::try_parse_from(["enroller", "show-config", "extra"]).is_err());
    }
}
