//! Oracle configuration
//!
//! Settings for a source reader: where to dial, which height range to read,
//! and how hard to retry a failing fetch.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Default number of additional attempts after a failed fetch
pub const DEFAULT_NUM_OF_RETRIES: u32 = 3;

/// Default wait before asking again for a block that is not produced yet
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Reading mode of an oracle
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OracleMode {
    /// Open-ended reading that tails the network head
    #[default]
    Live,
    /// Bounded replay of a fixed historical range
    Backfill,
}

impl OracleMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Backfill => "backfill",
        }
    }
}

impl fmt::Display for OracleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OracleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "backfill" => Ok(Self::Backfill),
            other => Err(format!("unknown oracle mode '{other}', expected live or backfill")),
        }
    }
}

/// Oracle configuration
///
/// # Example
///
/// ```toml
/// [oracle]
/// rpc_endpoint = "http://localhost:8545"
/// mode = "backfill"
/// start_height = 100
/// end_height = 200
/// num_of_retries = 3
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OracleConfig {
    /// JSON-RPC endpoint of the ledger node
    pub rpc_endpoint: String,

    /// Live or backfill
    /// Default: live
    pub mode: OracleMode,

    /// First height to read; unset means the network head at start time
    pub start_height: Option<u64>,

    /// Last height to read (inclusive); unset means no upper bound
    pub end_height: Option<u64>,

    /// Additional attempts after a failed fetch
    /// Default: 3 (four tries in total)
    pub num_of_retries: u32,

    /// Base delay between attempts, doubled on every retry
    /// Default: 0s (retry immediately)
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,

    /// Live mode only: wait before asking again for a block past the head
    /// Default: 1s
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint: String::new(),
            mode: OracleMode::Live,
            start_height: None,
            end_height: None,
            num_of_retries: DEFAULT_NUM_OF_RETRIES,
            retry_delay: Duration::ZERO,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl OracleConfig {
    /// Create config for an endpoint with all other fields defaulted
    pub fn with_endpoint(rpc_endpoint: impl Into<String>) -> Self {
        Self {
            rpc_endpoint: rpc_endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the height bounds
    pub fn with_heights(mut self, start: Option<u64>, end: Option<u64>) -> Self {
        self.start_height = start;
        self.end_height = end;
        self
    }

    /// Set the retry bound
    pub fn with_retries(mut self, num_of_retries: u32) -> Self {
        self.num_of_retries = num_of_retries;
        self
    }

    /// Set the reading mode
    pub fn with_mode(mut self, mode: OracleMode) -> Self {
        self.mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OracleConfig::default();
        assert!(config.rpc_endpoint.is_empty());
        assert_eq!(config.mode, OracleMode::Live);
        assert_eq!(config.start_height, None);
        assert_eq!(config.end_height, None);
        assert_eq!(config.num_of_retries, 3);
        assert_eq!(config.retry_delay, Duration::ZERO);
        assert_eq!(config.poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
rpc_endpoint = "http://localhost:8545"
mode = "backfill"
start_height = 5
end_height = 6
num_of_retries = 1
retry_delay = "250ms"
poll_interval = "2s"
"#;
        let config: OracleConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.rpc_endpoint, "http://localhost:8545");
        assert_eq!(config.mode, OracleMode::Backfill);
        assert_eq!(config.start_height, Some(5));
        assert_eq!(config.end_height, Some(6));
        assert_eq!(config.num_of_retries, 1);
        assert_eq!(config.retry_delay, Duration::from_millis(250));
        assert_eq!(config.poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("live".parse::<OracleMode>(), Ok(OracleMode::Live));
        assert_eq!("Backfill".parse::<OracleMode>(), Ok(OracleMode::Backfill));
        assert!("replay".parse::<OracleMode>().is_err());
    }

    #[test]
    fn test_builders() {
        let config = OracleConfig::with_endpoint("http://node:8545")
            .with_heights(Some(1), Some(5))
            .with_retries(0)
            .with_mode(OracleMode::Backfill);
        assert_eq!(config.rpc_endpoint, "http://node:8545");
        assert_eq!(config.start_height, Some(1));
        assert_eq!(config.end_height, Some(5));
        assert_eq!(config.num_of_retries, 0);
        assert_eq!(config.mode, OracleMode::Backfill);
    }
}
