//! Transit envelope
//!
//! `TransitData` is the unit of flow between components. The payload is only
//! meaningful together with the component that emitted it: adjacent
//! components agree out of band on the shape, and a consumer that receives
//! something else logs and skips it.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::component::ComponentType;
use crate::ledger::{Block, BlockHeight, Header, Transaction};

/// Payload carried by a `TransitData`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitValue {
    Header(Header),
    Block(Block),
    Transaction(Transaction),
}

impl TransitValue {
    /// Name of the payload shape, for logging type mismatches
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Header(_) => "header",
            Self::Block(_) => "block",
            Self::Transaction(_) => "transaction",
        }
    }
}

/// Record envelope moving between components
///
/// Cloning is cheap: the payload is shared behind an `Arc`, so fan-out to
/// several directives duplicates the handle, never the value.
#[derive(Debug, Clone)]
pub struct TransitData {
    origin: ComponentType,
    timestamp: Option<DateTime<Utc>>,
    value: Arc<TransitValue>,
}

impl TransitData {
    /// Create an envelope stamped with the current time
    pub fn new(origin: ComponentType, value: TransitValue) -> Self {
        Self {
            origin,
            timestamp: Some(Utc::now()),
            value: Arc::new(value),
        }
    }

    /// Create an envelope without a timestamp
    pub fn untimed(origin: ComponentType, value: TransitValue) -> Self {
        Self {
            origin,
            timestamp: None,
            value: Arc::new(value),
        }
    }

    /// Wrap a block emitted by `origin`
    pub fn block(origin: ComponentType, block: Block) -> Self {
        Self::new(origin, TransitValue::Block(block))
    }

    /// Wrap a transaction emitted by `origin`
    pub fn transaction(origin: ComponentType, tx: Transaction) -> Self {
        Self::new(origin, TransitValue::Transaction(tx))
    }

    /// Component type that produced this record
    #[inline]
    pub fn origin(&self) -> ComponentType {
        self.origin
    }

    /// Time the record was produced, if stamped
    #[inline]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// The payload
    #[inline]
    pub fn value(&self) -> &TransitValue {
        &self.value
    }

    /// Recover a header payload
    pub fn as_header(&self) -> Option<&Header> {
        match self.value.as_ref() {
            TransitValue::Header(h) => Some(h),
            _ => None,
        }
    }

    /// Recover a block payload
    pub fn as_block(&self) -> Option<&Block> {
        match self.value.as_ref() {
            TransitValue::Block(b) => Some(b),
            _ => None,
        }
    }

    /// Recover a transaction payload
    pub fn as_transaction(&self) -> Option<&Transaction> {
        match self.value.as_ref() {
            TransitValue::Transaction(tx) => Some(tx),
            _ => None,
        }
    }

    /// Height of the payload, when it has one
    pub fn height(&self) -> Option<BlockHeight> {
        match self.value.as_ref() {
            TransitValue::Header(h) => Some(h.number),
            TransitValue::Block(b) => Some(b.number()),
            TransitValue::Transaction(_) => None,
        }
    }

    /// Check if two envelopes share the same payload allocation
    #[inline]
    pub fn shares_value(&self, other: &TransitData) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}
