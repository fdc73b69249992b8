//! Component Registry - id to constructor lookup
//!
//! Maps logical component ids to constructors so a topology can be put
//! together from names rather than hard-wired types.
//!
//! # Design
//!
//! - **Tagged constructors**: oracles and pipes take different inputs, so
//!   `ComponentConstructor` is an enum with one variant per shape
//! - **Checked recovery**: callers ask a `Register` for the shape they need
//!   and get `ConstructorType` back on a mismatch
//!
//! # Example
//!
//! ```ignore
//! let registry = default_registry();
//!
//! let pipe = registry
//!     .get_register(CONTRACT_CREATE_TX)?
//!     .pipe_constructor()?
//!     .create(cancel.clone(), input)?;
//! ```

use std::collections::HashMap;

use conduit_pipeline::{OracleFactory, PipeFactory};
use conduit_protocol::ComponentType;

use crate::contract_create_tx::ContractCreateTxFactory;
use crate::error::{RegistryError, Result};
use crate::geth_block::GethBlockFactory;

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;

/// Id of the geth block oracle
pub const GETH_BLOCK: &str = "geth_block";

/// Id of the contract creation pipe
pub const CONTRACT_CREATE_TX: &str = "contract_create_tx";

/// A constructor of one of the known component shapes
pub enum ComponentConstructor {
    Oracle(Box<dyn OracleFactory>),
    Pipe(Box<dyn PipeFactory>),
}

impl ComponentConstructor {
    pub fn oracle<F: OracleFactory + 'static>(factory: F) -> Self {
        Self::Oracle(Box::new(factory))
    }

    pub fn pipe<F: PipeFactory + 'static>(factory: F) -> Self {
        Self::Pipe(Box::new(factory))
    }

    /// Kind of component this constructor builds
    pub fn component_type(&self) -> ComponentType {
        match self {
            Self::Oracle(_) => ComponentType::Oracle,
            Self::Pipe(_) => ComponentType::Pipe,
        }
    }
}

impl std::fmt::Debug for ComponentConstructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ComponentConstructor")
            .field(&self.component_type())
            .finish()
    }
}

/// A registry entry
#[derive(Debug)]
pub struct Register {
    id: String,
    constructor: ComponentConstructor,
}

impl Register {
    pub fn new(id: impl Into<String>, constructor: ComponentConstructor) -> Self {
        Self {
            id: id.into(),
            constructor,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn component_type(&self) -> ComponentType {
        self.constructor.component_type()
    }

    pub fn constructor(&self) -> &ComponentConstructor {
        &self.constructor
    }

    /// Recover the oracle constructor
    ///
    /// # Errors
    ///
    /// `ConstructorType` if this entry builds something else.
    pub fn oracle_constructor(&self) -> Result<&dyn OracleFactory> {
        match &self.constructor {
            ComponentConstructor::Oracle(factory) => Ok(factory.as_ref()),
            other => Err(self.mismatch(ComponentType::Oracle, other)),
        }
    }

    /// Recover the pipe constructor
    ///
    /// # Errors
    ///
    /// `ConstructorType` if this entry builds something else.
    pub fn pipe_constructor(&self) -> Result<&dyn PipeFactory> {
        match &self.constructor {
            ComponentConstructor::Pipe(factory) => Ok(factory.as_ref()),
            other => Err(self.mismatch(ComponentType::Pipe, other)),
        }
    }

    fn mismatch(&self, expected: ComponentType, actual: &ComponentConstructor) -> RegistryError {
        RegistryError::ConstructorType {
            id: self.id.clone(),
            expected,
            actual: actual.component_type(),
        }
    }
}

/// Registry of component constructors
pub struct Registry {
    registers: HashMap<String, Register>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            registers: HashMap::new(),
        }
    }

    /// Register a constructor under `id`
    ///
    /// # Panics
    /// Panics if `id` is already registered.
    /// Use `try_register` for fallible registration.
    pub fn register(&mut self, id: &str, constructor: ComponentConstructor) {
        if !self.try_register(id, constructor) {
            panic!("Component '{}' already registered", id);
        }
    }

    /// Try to register a constructor
    ///
    /// Returns `false` if `id` is already taken.
    pub fn try_register(&mut self, id: &str, constructor: ComponentConstructor) -> bool {
        if self.registers.contains_key(id) {
            return false;
        }
        self.registers
            .insert(id.to_string(), Register::new(id, constructor));
        true
    }

    /// Look up a register by id
    ///
    /// # Errors
    ///
    /// `UnknownComponent` if nothing is registered as `id`.
    pub fn get_register(&self, id: &str) -> Result<&Register> {
        self.registers
            .get(id)
            .ok_or_else(|| RegistryError::UnknownComponent(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.registers.contains_key(id)
    }

    /// Registered ids, sorted
    pub fn available_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.registers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a registry with all built-in components registered
///
/// Includes:
/// - `geth_block` - Block reader for Ethereum execution nodes (oracle)
/// - `contract_create_tx` - Contract creation extractor (pipe)
pub fn default_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register(GETH_BLOCK, ComponentConstructor::oracle(GethBlockFactory));
    registry.register(
        CONTRACT_CREATE_TX,
        ComponentConstructor::pipe(ContractCreateTxFactory),
    );
    registry
}
