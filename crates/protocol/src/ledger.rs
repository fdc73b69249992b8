//! Ledger record types
//!
//! Decoded forms of what a ledger client returns. Wire decoding lives in the
//! ledger crate; these types only carry the fields the pipeline uses.

use alloy_primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};

/// Block height on the ledger
pub type BlockHeight = u64;

/// Block header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub number: BlockHeight,
    pub hash: B256,
    pub parent_hash: B256,
    pub timestamp: u64,
}

/// Transaction as included in a block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: B256,
    pub from: Address,
    /// Recipient; `None` for contract creation
    pub to: Option<Address>,
    pub value: U256,
    pub nonce: u64,
    pub input: Bytes,
}

impl Transaction {
    /// Check if this transaction deploys a contract
    #[inline]
    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }
}

/// Full block: header plus its transactions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: Header,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Create a block from a header and its transactions
    pub fn new(header: Header, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
        }
    }

    /// Height of this block
    #[inline]
    pub fn number(&self) -> BlockHeight {
        self.header.number
    }

    /// Hash of this block
    #[inline]
    pub fn hash(&self) -> B256 {
        self.header.hash
    }

    /// Hash of the parent block
    #[inline]
    pub fn parent_hash(&self) -> B256 {
        self.header.parent_hash
    }
}
