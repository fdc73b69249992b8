//! Registry error types

use conduit_protocol::ComponentType;
use thiserror::Error;

/// Result type for registry lookups
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors from resolving a component register
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No register under this id
    #[error("no component registered as '{0}'")]
    UnknownComponent(String),

    /// Register exists but holds a constructor of another kind
    #[error("component '{id}' is registered as {actual}, expected {expected}")]
    ConstructorType {
        id: String,
        expected: ComponentType,
        actual: ComponentType,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RegistryError::UnknownComponent("nope".into());
        assert_eq!(err.to_string(), "no component registered as 'nope'");

        let err = RegistryError::ConstructorType {
            id: "geth_block".into(),
            expected: ComponentType::Pipe,
            actual: ComponentType::Oracle,
        };
        assert_eq!(
            err.to_string(),
            "component 'geth_block' is registered as oracle, expected pipe"
        );
    }
}
