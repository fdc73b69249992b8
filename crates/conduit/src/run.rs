//! Run - wire and drive the block reading pipeline
//!
//! Topology:
//!
//! ```text
//! geth_block oracle ──0x42──► contract_create_tx pipe ──0x420──► consumer (logs)
//! ```
//!
//! The process stops on SIGINT/SIGTERM, or once the pipeline drains on its
//! own (a finished backfill or a failed reading routine).

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use conduit_config::Config;
use conduit_ledger::{LedgerClient, RpcClient};
use conduit_pipeline::{Component, DirectiveId};
use conduit_protocol::TransitData;
use conduit_registry::{CONTRACT_CREATE_TX, GETH_BLOCK, default_registry};
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Directive from the oracle into the pipe
const INTER_DIRECTIVE_ID: DirectiveId = DirectiveId::new(0x42);

/// Directive from the pipe to the consumer
const OUT_DIRECTIVE_ID: DirectiveId = DirectiveId::new(0x420);

pub async fn run(config: Config) -> Result<()> {
    let cancel = CancellationToken::new();
    let registry = default_registry();
    let channel_size = config.pipeline.channel_size;

    // 1. Contract creation pipe
    let (oracle_tx, pipe_rx) = mpsc::channel(channel_size);
    let pipe = registry
        .get_register(CONTRACT_CREATE_TX)?
        .pipe_constructor()?
        .create(cancel.clone(), pipe_rx)
        .context("error during pipe initialization")?;

    // 2. Block oracle, dialed on construction
    let client: Arc<dyn LedgerClient> =
        Arc::new(RpcClient::new().context("failed to build ledger client")?);
    let oracle = registry
        .get_register(GETH_BLOCK)?
        .oracle_constructor()?
        .create(
            cancel.clone(),
            config.oracle.mode,
            config.oracle.clone(),
            client,
        )
        .await
        .context("error initializing oracle")?;

    // 3. Directives
    oracle
        .add_directive(INTER_DIRECTIVE_ID, oracle_tx)
        .with_context(|| format!("error adding directive {INTER_DIRECTIVE_ID}"))?;

    let (out_tx, out_rx) = mpsc::channel(channel_size);
    pipe.add_directive(OUT_DIRECTIVE_ID, out_tx)
        .with_context(|| format!("error adding directive {OUT_DIRECTIVE_ID}"))?;

    let pipe_task = spawn_event_loop(CONTRACT_CREATE_TX, Arc::clone(&pipe));
    let oracle_task = spawn_event_loop(GETH_BLOCK, Arc::clone(&oracle));
    let mut consumer_task = tokio::spawn(consume(out_rx));

    info!(
        endpoint = %config.oracle.rpc_endpoint,
        mode = %config.oracle.mode,
        start_height = ?config.oracle.start_height,
        end_height = ?config.oracle.end_height,
        channel_size,
        "conduit running"
    );

    tokio::select! {
        _ = wait_for_shutdown() => {
            info!("shutdown signal received, stopping pipeline...");
        }
        consumed = &mut consumer_task => {
            let received = consumed.unwrap_or_default();
            info!(received, "pipeline drained, stopping...");
        }
    }

    // Signal all components to stop via cancellation token
    cancel.cancel();

    let shutdown_timeout = config.pipeline.shutdown_timeout;
    shutdown(GETH_BLOCK, oracle, oracle_task, shutdown_timeout).await;
    shutdown(CONTRACT_CREATE_TX, pipe, pipe_task, shutdown_timeout).await;
    consumer_task.abort();

    info!("conduit stopped");
    Ok(())
}

fn spawn_event_loop(name: &'static str, component: Arc<dyn Component>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = component.event_loop().await {
            error!(component = name, error = %e, "error received from event loop");
        }
    })
}

/// Close a component and wait for its event loop, each within `timeout`
async fn shutdown(
    name: &'static str,
    component: Arc<dyn Component>,
    task: JoinHandle<()>,
    timeout: Duration,
) {
    if tokio::time::timeout(timeout, component.close()).await.is_err() {
        warn!(component = name, "component did not close within timeout");
    }

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(component = name, error = %e, "event loop panicked"),
        Err(_) => warn!(component = name, "event loop did not finish within timeout"),
    }
}

/// Terminal consumer: log every contract creation until the channel closes
///
/// Returns the number of transactions received.
async fn consume(mut rx: mpsc::Receiver<TransitData>) -> u64 {
    let mut received = 0;

    while let Some(data) = rx.recv().await {
        let Some(tx) = data.as_transaction() else {
            error!(kind = data.value().kind(), "could not parse transaction value");
            continue;
        };

        received += 1;
        info!(
            hash = %tx.hash,
            from = %tx.from,
            nonce = tx.nonce,
            value = %tx.value,
            input_len = tx.input.len(),
            "received contract creation transaction"
        );
    }

    received
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
