//! Tests for component types

use crate::ComponentType;

#[test]
fn test_component_type_as_str() {
    assert_eq!(ComponentType::Oracle.as_str(), "oracle");
    assert_eq!(ComponentType::Pipe.as_str(), "pipe");
    assert_eq!(ComponentType::Sink.as_str(), "sink");
}

#[test]
fn test_component_type_display() {
    assert_eq!(format!("{}", ComponentType::Oracle), "oracle");
    assert_eq!(ComponentType::Pipe.to_string(), "pipe");
}

#[test]
fn test_only_oracle_is_source() {
    assert!(ComponentType::Oracle.is_source());
    assert!(!ComponentType::Pipe.is_source());
    assert!(!ComponentType::Sink.is_source());
}
