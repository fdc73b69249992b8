//! Configuration validation
//!
//! Validates config consistency:
//! - The oracle has an endpoint to dial
//! - Channels can hold at least one record
//!
//! Height bounds are not checked here. Their consistency is enforced by the
//! reading routine, which reports the exact violation when it starts.

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_oracle(config)?;
    validate_pipeline(config)?;
    Ok(())
}

fn validate_oracle(config: &Config) -> Result<()> {
    if config.oracle.rpc_endpoint.trim().is_empty() {
        return Err(ConfigError::missing_field("oracle", "rpc_endpoint"));
    }
    Ok(())
}

fn validate_pipeline(config: &Config) -> Result<()> {
    if config.pipeline.channel_size == 0 {
        return Err(ConfigError::invalid_value(
            "pipeline",
            "channel_size",
            "must be at least 1",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OracleConfig;

    fn valid_config() -> Config {
        Config {
            oracle: OracleConfig::with_endpoint("http://localhost:8545"),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_blank_endpoint_rejected() {
        let mut config = valid_config();
        config.oracle.rpc_endpoint = "   ".into();

        let err = validate_config(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField {
                section: "oracle",
                field: "rpc_endpoint"
            }
        ));
    }

    #[test]
    fn test_zero_channel_size_rejected() {
        let mut config = valid_config();
        config.pipeline.channel_size = 0;

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("channel_size"));
    }

    #[test]
    fn test_inverted_heights_left_to_reader() {
        let mut config = valid_config();
        config.oracle.start_height = Some(10);
        config.oracle.end_height = Some(1);

        assert!(validate_config(&config).is_ok());
    }
}
