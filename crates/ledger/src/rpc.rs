//! JSON-RPC ledger client
//!
//! Talks to any Ethereum-compatible execution node over HTTP. Headers and
//! blocks are both read with `eth_getBlockByNumber`; the second parameter
//! selects whether full transaction objects are included.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, B256, Bytes, U64, U256};
use async_trait::async_trait;
use conduit_protocol::{Block, BlockHeight, Header, Transaction};
use parking_lot::RwLock;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::client::LedgerClient;
use crate::error::{ClientError, Result};

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Ledger client speaking Ethereum JSON-RPC over HTTP
pub struct RpcClient {
    http: Client,
    endpoint: RwLock<Option<Url>>,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create an undialed client with the default request timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create an undialed client with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: RwLock::new(None),
            next_id: AtomicU64::new(1),
        })
    }

    /// Endpoint this client was dialed with
    pub fn endpoint(&self) -> Option<String> {
        self.endpoint.read().as_ref().map(Url::to_string)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> Result<Option<T>> {
        let url = self.endpoint.read().clone().ok_or(ClientError::NotDialed)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let req = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(method, id, "sending RPC request");

        let body: serde_json::Value = self
            .http
            .post(url)
            .json(&req)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        decode_response(body)
    }
}

#[async_trait]
impl LedgerClient for RpcClient {
    async fn dial(&self, endpoint: &str) -> Result<()> {
        let url = Url::parse(endpoint).map_err(|e| ClientError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        *self.endpoint.write() = Some(url);

        let chain_id: U64 = self
            .call("eth_chainId", serde_json::json!([]))
            .await?
            .ok_or_else(|| ClientError::rpc(0, "eth_chainId returned no result"))?;

        info!(endpoint, chain_id = chain_id.to::<u64>(), "dialed ledger node");
        Ok(())
    }

    async fn header_by_number(&self, height: Option<BlockHeight>) -> Result<Header> {
        let tag = block_tag(height);
        let header: Option<RpcHeader> = self
            .call("eth_getBlockByNumber", serde_json::json!([tag, false]))
            .await?;

        header.map(Header::from).ok_or(ClientError::NotFound(tag))
    }

    async fn block_by_number(&self, height: BlockHeight) -> Result<Block> {
        let tag = block_tag(Some(height));
        let block: Option<RpcBlock> = self
            .call("eth_getBlockByNumber", serde_json::json!([tag, true]))
            .await?;

        block.map(Block::from).ok_or(ClientError::NotFound(tag))
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("endpoint", &self.endpoint())
            .finish()
    }
}

/// Hex quantity for a height, or `latest`
pub(crate) fn block_tag(height: Option<BlockHeight>) -> String {
    match height {
        Some(h) => format!("0x{h:x}"),
        None => "latest".to_string(),
    }
}

/// Unwrap a JSON-RPC response envelope
///
/// A `null` result is `Ok(None)`; an error object becomes `ClientError::Rpc`.
pub(crate) fn decode_response<T: DeserializeOwned>(body: serde_json::Value) -> Result<Option<T>> {
    let envelope: RpcEnvelope<T> = serde_json::from_value(body)?;

    if let Some(err) = envelope.error {
        return Err(ClientError::Rpc {
            code: err.code,
            message: err.message,
        });
    }

    Ok(envelope.result)
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RpcHeader {
    number: U64,
    hash: B256,
    parent_hash: B256,
    timestamp: U64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RpcTransaction {
    hash: B256,
    from: Address,
    #[serde(default)]
    to: Option<Address>,
    value: U256,
    nonce: U64,
    input: Bytes,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcBlock {
    #[serde(flatten)]
    header: RpcHeader,
    #[serde(default)]
    transactions: Vec<RpcTransaction>,
}

impl From<RpcHeader> for Header {
    fn from(h: RpcHeader) -> Self {
        Self {
            number: h.number.to::<u64>(),
            hash: h.hash,
            parent_hash: h.parent_hash,
            timestamp: h.timestamp.to::<u64>(),
        }
    }
}

impl From<RpcTransaction> for Transaction {
    fn from(tx: RpcTransaction) -> Self {
        Self {
            hash: tx.hash,
            from: tx.from,
            to: tx.to,
            value: tx.value,
            nonce: tx.nonce.to::<u64>(),
            input: tx.input,
        }
    }
}

impl From<RpcBlock> for Block {
    fn from(b: RpcBlock) -> Self {
        Block::new(
            b.header.into(),
            b.transactions.into_iter().map(Transaction::from).collect(),
        )
    }
}
