//! Pipeline error types
//!
//! Error types for routing, component lifecycles and reading routines.

use conduit_ledger::ClientError;
use conduit_protocol::BlockHeight;
use thiserror::Error;

use crate::directive::DirectiveId;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Open-ended start combined with a closed end
    #[error("cannot start with latest block height with end height configured")]
    LatestWithEndHeight {
        /// Configured end height
        end: BlockHeight,
    },

    /// Configured start is past the network head
    #[error("start height cannot be more than the latest height from network")]
    StartAboveNetworkHeight {
        start: BlockHeight,
        network: BlockHeight,
    },

    /// Start bound is past the end bound
    #[error("start height cannot be more than the end height")]
    StartAboveEndHeight {
        start: BlockHeight,
        end: BlockHeight,
    },

    /// Backfill mode without both height bounds
    #[error("backfill requires both start and end height to be configured")]
    MissingBackfillRange,

    /// Ledger fetch failed (after retries, where retried)
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Directive channel was already closed at registration
    #[error("invalid directive {0}: channel is closed")]
    InvalidDirective(DirectiveId),

    /// Receiving side of a component channel is gone
    #[error("component channel closed")]
    ChannelClosed,

    /// Delivery aborted by cancellation
    #[error("router is shutting down")]
    ShuttingDown,

    /// Event loop invoked while the previous one still runs
    #[error("event loop already running")]
    AlreadyRunning,

    /// Transform stage rejected a record
    #[error("transform failed: {0}")]
    TransformFailed(String),
}

impl PipelineError {
    /// Create a transform failed error
    pub fn transform(msg: impl Into<String>) -> Self {
        Self::TransformFailed(msg.into())
    }

    /// Check if this error is a bad height configuration
    ///
    /// Configuration errors are fatal to the routine and never retried.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::LatestWithEndHeight { .. } | Self::MissingBackfillRange
        )
    }

    /// Check if this error is a height bound violation
    pub fn is_height_range(&self) -> bool {
        matches!(
            self,
            Self::StartAboveNetworkHeight { .. } | Self::StartAboveEndHeight { .. }
        )
    }

    /// Check if this error came from the ledger client
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Client(_))
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
