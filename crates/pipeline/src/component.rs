//! Component capability
//!
//! Every pipeline stage (oracle, pipe, sink) implements `Component`.
//! Stages are shared as `Arc<dyn Component>` so the bootstrap can run the
//! event loop on one task and close from another.

use async_trait::async_trait;
use conduit_protocol::{ComponentType, TransitData};
use tokio::sync::mpsc;

use crate::directive::DirectiveId;
use crate::error::Result;

/// A pipeline stage
#[async_trait]
pub trait Component: Send + Sync {
    /// Role of this stage
    fn component_type(&self) -> ComponentType;

    /// Run until cancelled or until input is exhausted
    ///
    /// Cancellation is a clean return. An error means an internal fault.
    async fn event_loop(&self) -> Result<()>;

    /// Register an output destination on the stage's router
    fn add_directive(&self, id: DirectiveId, sender: mpsc::Sender<TransitData>) -> Result<()>;

    /// Wait until every task the stage spawned has exited
    ///
    /// Safe to call more than once, and from several tasks.
    async fn close(&self);
}
