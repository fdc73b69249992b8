//! Pipeline-wide settings
//!
//! These settings apply to every component wired into the topology.

use std::time::Duration;

use serde::Deserialize;

/// Pipeline configuration shared by all components
///
/// All fields have sensible defaults - you only need to specify what you want to change.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Capacity of every directive and internal channel
    /// Default: 1 (closest to a rendezvous channel; a slow consumer stalls its producer)
    pub channel_size: usize,

    /// How long shutdown waits for each component to finish
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_size: 1,
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.channel_size, 1);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: PipelineConfig = toml::from_str("channel_size = 64").unwrap();
        assert_eq!(config.channel_size, 64);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(10));
    }
}
