//! Hand-written ledger client fake shared by the registry tests

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use conduit_ledger::{ClientError, LedgerClient, Result};
use conduit_protocol::{B256, Block, BlockHeight, Header};
use parking_lot::Mutex;

pub(crate) const PARENT_HASH: B256 = B256::repeat_byte(0x12);

pub(crate) fn header_at(number: BlockHeight) -> Header {
    Header {
        number,
        parent_hash: PARENT_HASH,
        ..Default::default()
    }
}

/// Ledger node that answers every header lookup with the same header and
/// every block lookup with the same block
#[derive(Default)]
pub(crate) struct FakeLedger {
    header: Option<Header>,
    block: Option<Block>,
    dial_error: Option<String>,
    tip: Option<BlockHeight>,
    block_failures: u32,

    pub dials: AtomicU32,
    pub header_calls: AtomicU32,
    pub block_calls: AtomicU32,
    pub fetched: Mutex<Vec<BlockHeight>>,
}

impl FakeLedger {
    /// Node whose head and every block carry `head` as header number
    pub fn with_head(head: BlockHeight) -> Self {
        let header = header_at(head);
        Self {
            block: Some(Block::new(header.clone(), Vec::new())),
            header: Some(header),
            ..Default::default()
        }
    }

    /// Node that fails every lookup
    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn failing_dial(mut self, message: &str) -> Self {
        self.dial_error = Some(message.to_string());
        self
    }

    /// Heights above `tip` are not produced yet
    pub fn with_tip(mut self, tip: BlockHeight) -> Self {
        self.tip = Some(tip);
        self
    }

    /// Fail the first `n` block lookups
    pub fn with_block_failures(mut self, n: u32) -> Self {
        self.block_failures = n;
        self
    }

    pub fn header_calls(&self) -> u32 {
        self.header_calls.load(Ordering::SeqCst)
    }

    pub fn block_calls(&self) -> u32 {
        self.block_calls.load(Ordering::SeqCst)
    }

    pub fn fetched(&self) -> Vec<BlockHeight> {
        self.fetched.lock().clone()
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn dial(&self, _endpoint: &str) -> Result<()> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        match &self.dial_error {
            Some(message) => Err(ClientError::rpc(-32000, message.clone())),
            None => Ok(()),
        }
    }

    async fn header_by_number(&self, height: Option<BlockHeight>) -> Result<Header> {
        self.header_calls.fetch_add(1, Ordering::SeqCst);

        if let (Some(tip), Some(height)) = (self.tip, height)
            && height > tip
        {
            return Err(ClientError::NotFound(format!("0x{height:x}")));
        }

        self.header
            .clone()
            .ok_or_else(|| ClientError::rpc(-32000, "no header for you"))
    }

    async fn block_by_number(&self, height: BlockHeight) -> Result<Block> {
        let call = self.block_calls.fetch_add(1, Ordering::SeqCst);
        if call < self.block_failures {
            return Err(ClientError::rpc(-32000, "no block for you"));
        }

        let block = self
            .block
            .clone()
            .ok_or_else(|| ClientError::rpc(-32000, "no block for you"))?;
        self.fetched.lock().push(height);
        Ok(block)
    }
}
