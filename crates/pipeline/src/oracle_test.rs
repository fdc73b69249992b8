//! Oracle tests
//!
//! Drive the oracle with a scripted definition: construction, relaying,
//! backfill dispatch, routine failure and cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use conduit_config::{OracleConfig, OracleMode};
use conduit_ledger::ClientError;
use conduit_protocol::{Block, BlockHeight, ComponentType, Header, TransitData};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::{Component, DirectiveId, Oracle, OracleDefinition, PipelineError, ReadMode, Result};

fn block_at(number: BlockHeight) -> TransitData {
    let header = Header {
        number,
        ..Default::default()
    };
    TransitData::block(ComponentType::Oracle, Block::new(header, Vec::new()))
}

async fn recv(rx: &mut mpsc::Receiver<TransitData>) -> Option<TransitData> {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for record")
}

/// Reading strategy that replays a fixed script
#[derive(Default)]
struct ScriptedDefinition {
    live_heights: Vec<BlockHeight>,
    fail_configure: bool,
    fail_after_emit: bool,
    hold_open: bool,
    configured: Arc<AtomicU32>,
    backfills: Arc<AtomicU32>,
}

impl ScriptedDefinition {
    async fn emit(
        cancel: &CancellationToken,
        out: &mpsc::Sender<TransitData>,
        height: BlockHeight,
    ) -> Result<bool> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Ok(false),
            sent = out.send(block_at(height)) => sent
                .map(|_| true)
                .map_err(|_| PipelineError::ChannelClosed),
        }
    }
}

#[async_trait]
impl OracleDefinition for ScriptedDefinition {
    async fn configure_routine(&mut self) -> Result<()> {
        self.configured.fetch_add(1, Ordering::SeqCst);
        if self.fail_configure {
            return Err(ClientError::InvalidEndpoint {
                endpoint: "nowhere".into(),
                reason: "scripted".into(),
            }
            .into());
        }
        Ok(())
    }

    async fn read_routine(
        &mut self,
        cancel: CancellationToken,
        out: mpsc::Sender<TransitData>,
    ) -> Result<()> {
        for h in self.live_heights.clone() {
            if !Self::emit(&cancel, &out, h).await? {
                return Ok(());
            }
        }

        if self.fail_after_emit {
            return Err(ClientError::rpc(-32000, "scripted failure").into());
        }

        if self.hold_open {
            cancel.cancelled().await;
        }
        Ok(())
    }

    async fn backfill_routine(
        &mut self,
        cancel: CancellationToken,
        out: mpsc::Sender<TransitData>,
        start: BlockHeight,
        end: BlockHeight,
    ) -> Result<()> {
        self.backfills.fetch_add(1, Ordering::SeqCst);
        for h in start..=end {
            if !Self::emit(&cancel, &out, h).await? {
                return Ok(());
            }
        }
        Ok(())
    }
}

// ============================================================================
// Construction
// ============================================================================

#[tokio::test]
async fn test_configure_failure_aborts_construction() {
    let configured = Arc::new(AtomicU32::new(0));
    let definition = ScriptedDefinition {
        fail_configure: true,
        configured: Arc::clone(&configured),
        ..Default::default()
    };

    let result = Oracle::new(CancellationToken::new(), ReadMode::Live, Box::new(definition)).await;

    assert!(matches!(result, Err(PipelineError::Client(_))));
    assert_eq!(configured.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_configure_runs_once() {
    let configured = Arc::new(AtomicU32::new(0));
    let definition = ScriptedDefinition {
        configured: Arc::clone(&configured),
        ..Default::default()
    };

    let oracle = Oracle::new(CancellationToken::new(), ReadMode::Live, Box::new(definition))
        .await
        .unwrap();

    assert_eq!(configured.load(Ordering::SeqCst), 1);
    assert_eq!(oracle.component_type(), ComponentType::Oracle);
    assert_eq!(oracle.mode(), ReadMode::Live);
}

#[test]
fn test_read_mode_from_config() {
    let cfg = OracleConfig::with_endpoint("http://localhost:8545");
    assert_eq!(ReadMode::from_config(OracleMode::Live, &cfg).unwrap(), ReadMode::Live);

    let bounded = cfg.clone().with_heights(Some(5), Some(6));
    assert_eq!(
        ReadMode::from_config(OracleMode::Backfill, &bounded).unwrap(),
        ReadMode::Backfill { start: 5, end: 6 }
    );

    let open = cfg.with_heights(Some(5), None);
    assert!(matches!(
        ReadMode::from_config(OracleMode::Backfill, &open),
        Err(PipelineError::MissingBackfillRange)
    ));
}

// ============================================================================
// Relaying
// ============================================================================

#[tokio::test]
async fn test_relays_live_records_in_order() {
    let definition = ScriptedDefinition {
        live_heights: vec![1, 2, 3],
        ..Default::default()
    };
    let oracle = Oracle::new(CancellationToken::new(), ReadMode::Live, Box::new(definition))
        .await
        .unwrap();

    let (tx_a, mut rx_a) = mpsc::channel(1);
    let (tx_b, mut rx_b) = mpsc::channel(1);
    oracle.add_directive(DirectiveId::new(0), tx_a).unwrap();
    oracle.add_directive(DirectiveId::new(1), tx_b).unwrap();

    let oracle = Arc::new(oracle);
    let handle = {
        let oracle = Arc::clone(&oracle);
        tokio::spawn(async move { oracle.event_loop().await })
    };

    for h in 1..=3 {
        assert_eq!(recv(&mut rx_a).await.unwrap().height(), Some(h));
        assert_eq!(recv(&mut rx_b).await.unwrap().height(), Some(h));
    }

    // Routine finished: loop exits and directives are closed
    let result = timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    assert!(result.is_ok());
    assert!(recv(&mut rx_a).await.is_none());
    assert!(recv(&mut rx_b).await.is_none());

    oracle.close().await;
}

#[tokio::test]
async fn test_backfill_mode_dispatch() {
    let backfills = Arc::new(AtomicU32::new(0));
    let definition = ScriptedDefinition {
        live_heights: vec![99],
        backfills: Arc::clone(&backfills),
        ..Default::default()
    };
    let oracle = Oracle::new(
        CancellationToken::new(),
        ReadMode::Backfill { start: 5, end: 6 },
        Box::new(definition),
    )
    .await
    .unwrap();

    let (tx, mut rx) = mpsc::channel(4);
    oracle.add_directive(DirectiveId::new(0), tx).unwrap();

    timeout(Duration::from_secs(1), oracle.event_loop())
        .await
        .unwrap()
        .unwrap();
    oracle.close().await;

    assert_eq!(backfills.load(Ordering::SeqCst), 1);
    assert_eq!(recv(&mut rx).await.unwrap().height(), Some(5));
    assert_eq!(recv(&mut rx).await.unwrap().height(), Some(6));
    assert!(recv(&mut rx).await.is_none());
}

#[tokio::test]
async fn test_routine_failure_ends_loop_cleanly() {
    let definition = ScriptedDefinition {
        live_heights: vec![1],
        fail_after_emit: true,
        ..Default::default()
    };
    let oracle = Oracle::new(CancellationToken::new(), ReadMode::Live, Box::new(definition))
        .await
        .unwrap();

    let (tx, mut rx) = mpsc::channel(4);
    oracle.add_directive(DirectiveId::new(0), tx).unwrap();

    let result = timeout(Duration::from_secs(1), oracle.event_loop()).await.unwrap();
    assert!(result.is_ok());

    assert_eq!(recv(&mut rx).await.unwrap().height(), Some(1));
    assert!(recv(&mut rx).await.is_none());

    oracle.close().await;
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancel_stops_loop_and_close_joins() {
    let cancel = CancellationToken::new();
    let definition = ScriptedDefinition {
        live_heights: vec![1],
        hold_open: true,
        ..Default::default()
    };
    let oracle = Arc::new(
        Oracle::new(cancel.clone(), ReadMode::Live, Box::new(definition))
            .await
            .unwrap(),
    );

    let (tx, mut rx) = mpsc::channel(1);
    oracle.add_directive(DirectiveId::new(0), tx).unwrap();

    let handle = {
        let oracle = Arc::clone(&oracle);
        tokio::spawn(async move { oracle.event_loop().await })
    };

    assert_eq!(recv(&mut rx).await.unwrap().height(), Some(1));

    cancel.cancel();
    let result = timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    assert!(result.is_ok());

    // Close is a join point and may be repeated
    timeout(Duration::from_secs(1), oracle.close()).await.unwrap();
    timeout(Duration::from_secs(1), oracle.close()).await.unwrap();
}

#[tokio::test]
async fn test_cancel_with_stalled_consumer() {
    let cancel = CancellationToken::new();
    let definition = ScriptedDefinition {
        live_heights: (1..100).collect(),
        ..Default::default()
    };
    let oracle = Arc::new(
        Oracle::new(cancel.clone(), ReadMode::Live, Box::new(definition))
            .await
            .unwrap(),
    );

    // Never drained
    let (tx, _rx) = mpsc::channel(1);
    oracle.add_directive(DirectiveId::new(0), tx).unwrap();

    let handle = {
        let oracle = Arc::clone(&oracle);
        tokio::spawn(async move { oracle.event_loop().await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();

    let result = timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    assert!(result.is_ok());
    timeout(Duration::from_secs(1), oracle.close()).await.unwrap();
}

#[tokio::test]
async fn test_second_event_loop_rejected() {
    let cancel = CancellationToken::new();
    let definition = ScriptedDefinition {
        hold_open: true,
        ..Default::default()
    };
    let oracle = Arc::new(
        Oracle::new(cancel.clone(), ReadMode::Live, Box::new(definition))
            .await
            .unwrap(),
    );

    let handle = {
        let oracle = Arc::clone(&oracle);
        tokio::spawn(async move { oracle.event_loop().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let second = oracle.event_loop().await;
    assert!(matches!(second, Err(PipelineError::AlreadyRunning)));

    cancel.cancel();
    assert!(timeout(Duration::from_secs(1), handle).await.unwrap().unwrap().is_ok());
    oracle.close().await;
}

#[tokio::test]
async fn test_event_loop_restartable_after_drop() {
    let cancel = CancellationToken::new();
    let definition = ScriptedDefinition {
        hold_open: true,
        ..Default::default()
    };
    let oracle = Arc::new(
        Oracle::new(cancel.clone(), ReadMode::Live, Box::new(definition))
            .await
            .unwrap(),
    );

    // Abandon the first loop mid-flight
    assert!(
        timeout(Duration::from_millis(20), oracle.event_loop())
            .await
            .is_err()
    );

    let handle = {
        let oracle = Arc::clone(&oracle);
        tokio::spawn(async move { oracle.event_loop().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!handle.is_finished());

    cancel.cancel();
    let result = timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    assert!(result.is_ok());
    timeout(Duration::from_secs(1), oracle.close()).await.unwrap();
}
