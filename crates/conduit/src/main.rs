//! Conduit - block reading pipeline
//!
//! # Usage
//!
//! ```bash
//! # Tail the chain head
//! conduit --rpc-endpoint http://localhost:8545
//!
//! # Replay a fixed range
//! conduit --config configs/conduit.toml --mode backfill --start-height 100 --end-height 200
//! ```

mod run;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use conduit_config::{Config, LogConfig, LogFormat, LogOutput, OracleMode};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Conduit - block reading pipeline
#[derive(Parser, Debug)]
#[command(name = "conduit")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (error if specified but not found)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long)]
    log_level: Option<String>,

    /// JSON-RPC endpoint of the L1 execution node. Overrides config file.
    #[arg(long, env = "L1_RPC_ENDPOINT")]
    rpc_endpoint: Option<String>,

    /// Reading mode (live, backfill). Overrides config file.
    #[arg(long)]
    mode: Option<OracleMode>,

    /// First block height to read. Overrides config file.
    #[arg(long)]
    start_height: Option<u64>,

    /// Last block height to read, inclusive. Overrides config file.
    #[arg(long)]
    end_height: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    init_logging(&config.log, cli.log_level.as_deref())?;

    apply_overrides(&mut config, &cli);
    config.validate().context("invalid configuration")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        mode = %config.oracle.mode,
        "conduit boot up"
    );

    run::run(config).await
}

/// Load the config file without validating it, or defaults without one
fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;

    Config::parse_unvalidated(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

/// Command line values win over the file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    let oracle = &mut config.oracle;

    if let Some(endpoint) = &cli.rpc_endpoint {
        oracle.rpc_endpoint.clone_from(endpoint);
    }
    if let Some(mode) = cli.mode {
        oracle.mode = mode;
    }
    if cli.start_height.is_some() {
        oracle.start_height = cli.start_height;
    }
    if cli.end_height.is_some() {
        oracle.end_height = cli.end_height;
    }
}

/// Initialize the tracing subscriber for logging
///
/// Level: CLI flag > config file > "info".
fn init_logging(log: &LogConfig, cli_level: Option<&str>) -> Result<()> {
    let level = cli_level.unwrap_or(log.level.as_str());
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);

    match (log.format, log.output) {
        (LogFormat::Console, LogOutput::Stdout) => registry
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init(),
        (LogFormat::Console, LogOutput::Stderr) => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
        (LogFormat::Json, LogOutput::Stdout) => registry.with(fmt::layer().json()).init(),
        (LogFormat::Json, LogOutput::Stderr) => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }

    Ok(())
}
