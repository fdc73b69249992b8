//! Conduit Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Minimal config should just work - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use conduit_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[oracle]\nrpc_endpoint = \"http://localhost:8545\"").unwrap();
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [log]
//! level = "info"
//!
//! [pipeline]
//! channel_size = 1
//! shutdown_timeout = "10s"
//!
//! [oracle]
//! rpc_endpoint = "http://localhost:8545"
//! mode = "live"
//! num_of_retries = 3
//! ```

mod error;
mod logging;
mod oracle;
mod pipeline;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use oracle::{DEFAULT_NUM_OF_RETRIES, DEFAULT_POLL_INTERVAL, OracleConfig, OracleMode};
pub use pipeline::PipelineConfig;

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults, except that the oracle
/// needs an `rpc_endpoint` to pass validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Channel sizing and shutdown behaviour
    pub pipeline: PipelineConfig,

    /// Source reader settings
    pub oracle: OracleConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string without validating it
    ///
    /// Used when values are still to be overridden (e.g. from the command
    /// line); call `validate()` once they are applied.
    pub fn parse_unvalidated(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(ConfigError::ParseError)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let config = Self::parse_unvalidated(s)?;
        config.validate()?;
        Ok(config)
    }
}
