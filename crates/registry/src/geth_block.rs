//! Geth block oracle definition
//!
//! Tails an Ethereum execution node block by block. Each height is confirmed
//! with a header lookup, then the full block is fetched and emitted.
//!
//! # Height state
//!
//! `curr_height` is the cursor: the next height to process. It is unset until
//! the first block is emitted and then advances by exactly one per emitted
//! block. Resolution order for the first height is cursor, configured
//! `start_height`, network head.

use std::sync::Arc;

use async_trait::async_trait;
use conduit_config::{OracleConfig, OracleMode};
use conduit_ledger::LedgerClient;
use conduit_pipeline::{
    Component, Oracle, OracleDefinition, OracleFactory, PipelineError, ReadMode, Result,
    RetryPolicy, execute_with_retry,
};
use conduit_protocol::{Block, BlockHeight, ComponentType, Header, TransitData};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Reading strategy for Ethereum-compatible execution nodes
pub struct GethBlockDefinition {
    cfg: OracleConfig,
    client: Arc<dyn LedgerClient>,
    retry: RetryPolicy,
    curr_height: Option<BlockHeight>,
}

impl GethBlockDefinition {
    pub fn new(cfg: OracleConfig, client: Arc<dyn LedgerClient>) -> Self {
        Self {
            retry: RetryPolicy::from(&cfg),
            cfg,
            client,
            curr_height: None,
        }
    }

    /// Next height the routine will process, if it has started
    pub fn current_height(&self) -> Option<BlockHeight> {
        self.curr_height
    }

    /// Height to start from without asking the network
    ///
    /// `None` means the network head.
    pub(crate) fn height_to_process(&self) -> Option<BlockHeight> {
        self.curr_height.or(self.cfg.start_height)
    }

    /// Latest header known to the node
    pub(crate) async fn get_current_height_from_network(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Header> {
        let client = &self.client;
        execute_with_retry(&self.retry, cancel, "header_by_number", move || async move {
            client.header_by_number(None).await
        })
        .await
    }

    /// Fail if `start` is past the network head
    async fn check_network_height(
        &self,
        cancel: &CancellationToken,
        start: BlockHeight,
    ) -> Result<()> {
        let network = self.get_current_height_from_network(cancel).await?.number;
        if start > network {
            return Err(PipelineError::StartAboveNetworkHeight { start, network });
        }
        Ok(())
    }

    /// Header at `height`
    ///
    /// With `tail` set, a height the node has not produced yet is `Ok(None)`
    /// instead of an error, and does not count against the retry bound.
    async fn fetch_header(
        &self,
        cancel: &CancellationToken,
        height: BlockHeight,
        tail: bool,
    ) -> Result<Option<Header>> {
        let client = &self.client;
        execute_with_retry(&self.retry, cancel, "header_by_number", move || async move {
            match client.header_by_number(Some(height)).await {
                Ok(header) => Ok(Some(header)),
                Err(e) if tail && e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
    }

    async fn fetch_block(&self, cancel: &CancellationToken, height: BlockHeight) -> Result<Block> {
        let client = &self.client;
        execute_with_retry(&self.retry, cancel, "block_by_number", move || async move {
            client.block_by_number(height).await
        })
        .await
    }

    /// Emit `first..=end` (unbounded without `end`), advancing the cursor
    ///
    /// Returns `Ok` on cancellation.
    async fn read_range(
        &mut self,
        cancel: &CancellationToken,
        out: &mpsc::Sender<TransitData>,
        first: BlockHeight,
        end: Option<BlockHeight>,
        tail: bool,
    ) -> Result<()> {
        let mut height = first;

        while end.is_none_or(|end| height <= end) {
            if cancel.is_cancelled() {
                return Ok(());
            }

            let header = loop {
                if let Some(header) = self.fetch_header(cancel, height, tail).await? {
                    break header;
                }

                trace!(height, "block not produced yet");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Ok(()),
                    _ = tokio::time::sleep(self.cfg.poll_interval) => {}
                }
            };

            let block = self.fetch_block(cancel, height).await?;
            debug!(
                height,
                hash = %header.hash,
                tx_count = block.transactions.len(),
                "fetched block"
            );

            let data = TransitData::block(ComponentType::Oracle, block);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                sent = out.send(data) => sent.map_err(|_| PipelineError::ChannelClosed)?,
            }

            let Some(next) = height.checked_add(1) else {
                return Ok(());
            };
            self.curr_height = Some(next);
            height = next;
        }

        Ok(())
    }

    async fn read(
        &mut self,
        cancel: &CancellationToken,
        out: &mpsc::Sender<TransitData>,
    ) -> Result<()> {
        let (start, end) = (self.cfg.start_height, self.cfg.end_height);

        match (start, end) {
            (None, Some(end)) => return Err(PipelineError::LatestWithEndHeight { end }),
            (Some(start), Some(end)) if start > end => {
                return Err(PipelineError::StartAboveEndHeight { start, end });
            }
            _ => {}
        }

        if let Some(start) = start {
            self.check_network_height(cancel, start).await?;
        }

        let first = match self.height_to_process() {
            Some(height) => height,
            None => self.get_current_height_from_network(cancel).await?.number,
        };

        info!(first, end = ?end, "reading blocks");
        self.read_range(cancel, out, first, end, true).await
    }

    async fn backfill(
        &mut self,
        cancel: &CancellationToken,
        out: &mpsc::Sender<TransitData>,
        start: BlockHeight,
        end: BlockHeight,
    ) -> Result<()> {
        if start > end {
            return Err(PipelineError::StartAboveEndHeight { start, end });
        }

        self.check_network_height(cancel, start).await?;

        info!(start, end, "backfilling blocks");
        self.read_range(cancel, out, start, Some(end), false).await
    }
}

/// Cancellation observed mid-retry is a clean exit
fn clean_on_cancel(result: Result<()>, cancel: &CancellationToken) -> Result<()> {
    match result {
        Err(PipelineError::ShuttingDown | PipelineError::ChannelClosed) if cancel.is_cancelled() => {
            Ok(())
        }
        other => other,
    }
}

#[async_trait]
impl OracleDefinition for GethBlockDefinition {
    async fn configure_routine(&mut self) -> Result<()> {
        self.client.dial(&self.cfg.rpc_endpoint).await?;
        debug!(endpoint = %self.cfg.rpc_endpoint, "geth block oracle configured");
        Ok(())
    }

    async fn read_routine(
        &mut self,
        cancel: CancellationToken,
        out: mpsc::Sender<TransitData>,
    ) -> Result<()> {
        let result = self.read(&cancel, &out).await;
        clean_on_cancel(result, &cancel)
    }

    async fn backfill_routine(
        &mut self,
        cancel: CancellationToken,
        out: mpsc::Sender<TransitData>,
        start: BlockHeight,
        end: BlockHeight,
    ) -> Result<()> {
        let result = self.backfill(&cancel, &out, start, end).await;
        clean_on_cancel(result, &cancel)
    }
}

impl std::fmt::Debug for GethBlockDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GethBlockDefinition")
            .field("endpoint", &self.cfg.rpc_endpoint)
            .field("curr_height", &self.curr_height)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Constructor for the geth block oracle
pub struct GethBlockFactory;

#[async_trait]
impl OracleFactory for GethBlockFactory {
    async fn create(
        &self,
        cancel: CancellationToken,
        mode: OracleMode,
        cfg: OracleConfig,
        client: Arc<dyn LedgerClient>,
    ) -> Result<Arc<dyn Component>> {
        let read_mode = ReadMode::from_config(mode, &cfg)?;
        let definition = GethBlockDefinition::new(cfg, client);
        let oracle = Oracle::new(cancel, read_mode, Box::new(definition)).await?;
        Ok(Arc::new(oracle))
    }
}

#[cfg(test)]
#[path = "geth_block_test.rs"]
mod tests;
