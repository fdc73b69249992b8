//! Component constructor shapes
//!
//! Oracles and pipes are built from different inputs, so each kind has its
//! own factory trait. The registry stores one of either per entry.

use std::sync::Arc;

use async_trait::async_trait;
use conduit_config::{OracleConfig, OracleMode};
use conduit_ledger::LedgerClient;
use conduit_protocol::TransitData;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::component::Component;
use crate::error::Result;

/// Builds a source reader
#[async_trait]
pub trait OracleFactory: Send + Sync {
    async fn create(
        &self,
        cancel: CancellationToken,
        mode: OracleMode,
        cfg: OracleConfig,
        client: Arc<dyn LedgerClient>,
    ) -> Result<Arc<dyn Component>>;
}

/// Builds a transform stage over an upstream channel
pub trait PipeFactory: Send + Sync {
    fn create(
        &self,
        cancel: CancellationToken,
        input: mpsc::Receiver<TransitData>,
    ) -> Result<Arc<dyn Component>>;
}
