//! Conduit Protocol - Core types for the conduit pipeline
//!
//! This crate provides the foundational types that flow between components:
//! - `TransitData` - The record envelope moved over directive channels
//! - `TransitValue` - The payload carried by an envelope
//! - `ComponentType` - Oracle, Pipe, or Sink role tag
//! - `Header`, `Block`, `Transaction` - Ledger records produced by oracles
//!
//! # Design Principles
//!
//! - **Cheap fan-out**: `TransitData` clones share the payload through an `Arc`
//! - **Checked recovery**: consumers ask for the shape they expect
//!   (`as_block()`, `as_transaction()`) and get `None` on a mismatch
//! - **Provenance**: every envelope records the component type that emitted it

mod component;
mod ledger;
mod transit;

pub use component::ComponentType;
pub use ledger::{Block, BlockHeight, Header, Transaction};
pub use transit::{TransitData, TransitValue};

// Re-export ledger primitives for convenience
pub use alloy_primitives::{Address, B256, Bytes, U256};

#[cfg(test)]
mod component_test;
