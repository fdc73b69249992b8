//! Conduit Ledger - Ledger client capability
//!
//! Oracles read the ledger through the `LedgerClient` trait, never through a
//! concrete client. This keeps reading strategies testable against in-memory
//! fakes and lets deployments swap transports.
//!
//! # Available Clients
//!
//! - **RpcClient** - Ethereum JSON-RPC over HTTP (`eth_getBlockByNumber`)
//!
//! # Example
//!
//! ```ignore
//! use conduit_ledger::{LedgerClient, RpcClient};
//!
//! let client = RpcClient::new()?;
//! client.dial("http://localhost:8545").await?;
//!
//! let head = client.header_by_number(None).await?;
//! let block = client.block_by_number(head.number).await?;
//! ```

mod client;
mod error;
mod rpc;

pub use client::LedgerClient;
pub use error::{ClientError, Result};
pub use rpc::{DEFAULT_REQUEST_TIMEOUT, RpcClient};
