//! Ledger client trait definition

use async_trait::async_trait;
use conduit_protocol::{Block, BlockHeight, Header};

use crate::error::Result;

/// Capability to read headers and blocks from a ledger node
///
/// Every call may fail transiently. Callers own the retry policy; clients
/// make exactly one attempt per call and never re-dial on their own.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Connect to `endpoint`
    ///
    /// Must succeed before any fetch.
    async fn dial(&self, endpoint: &str) -> Result<()>;

    /// Fetch the header at `height`, or the latest header when `None`
    async fn header_by_number(&self, height: Option<BlockHeight>) -> Result<Header>;

    /// Fetch the full block (with transactions) at `height`
    async fn block_by_number(&self, height: BlockHeight) -> Result<Block>;
}
