//! Conduit Registry
//!
//! Named component constructors and the built-in definitions behind them.
//!
//! | id | kind | reads / emits |
//! |----|------|---------------|
//! | `geth_block` | oracle | blocks from an execution node |
//! | `contract_create_tx` | pipe | contract creation transactions from blocks |

mod contract_create_tx;
mod error;
mod geth_block;
mod registry;

#[cfg(test)]
mod testing;

pub use contract_create_tx::{ContractCreateTxDefinition, ContractCreateTxFactory};
pub use error::{RegistryError, Result};
pub use geth_block::{GethBlockDefinition, GethBlockFactory};
pub use registry::{
    CONTRACT_CREATE_TX, ComponentConstructor, GETH_BLOCK, Register, Registry, default_registry,
};
