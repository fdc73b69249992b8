//! Component role types
//!
//! `ComponentType` tags every pipeline stage with the role it plays.

use std::fmt;

/// Role of a pipeline component
///
/// Used for provenance on `TransitData` and for registry bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    /// Reads from an external data source and emits records
    Oracle,
    /// Transforms records received from upstream
    Pipe,
    /// Terminal consumer of records
    Sink,
}

impl ComponentType {
    /// Get the string name of this component type
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Oracle => "oracle",
            Self::Pipe => "pipe",
            Self::Sink => "sink",
        }
    }

    /// Check if this component produces records from an external source
    #[inline]
    pub const fn is_source(self) -> bool {
        matches!(self, Self::Oracle)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
