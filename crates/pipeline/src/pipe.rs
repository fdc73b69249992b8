//! Pipe - transform component
//!
//! A `Pipe` reads records from an upstream channel, runs each through its
//! `PipeDefinition`, and fans every produced record out to its directives.
//! Failed transforms are logged and the record is skipped.

use async_trait::async_trait;
use conduit_protocol::{ComponentType, TransitData};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::component::Component;
use crate::directive::DirectiveId;
use crate::error::{PipelineError, Result};
use crate::router::OutputRouter;

/// Per-record transformation plugged into a `Pipe`
pub trait PipeDefinition: Send + Sync {
    /// Name for logging
    fn name(&self) -> &'static str;

    /// Turn one input record into zero or more output records
    fn transform(&self, data: TransitData) -> Result<Vec<TransitData>>;
}

/// Transform component
pub struct Pipe {
    cancel: CancellationToken,
    input: Mutex<mpsc::Receiver<TransitData>>,
    definition: Box<dyn PipeDefinition>,
    router: OutputRouter,
}

impl Pipe {
    pub fn new(
        cancel: CancellationToken,
        input: mpsc::Receiver<TransitData>,
        definition: Box<dyn PipeDefinition>,
    ) -> Self {
        Self {
            router: OutputRouter::new(cancel.clone()),
            cancel,
            input: Mutex::new(input),
            definition,
        }
    }

    /// The pipe's output router
    pub fn router(&self) -> &OutputRouter {
        &self.router
    }

    async fn process(&self, data: TransitData) -> Result<()> {
        let outputs = match self.definition.transform(data) {
            Ok(outputs) => outputs,
            Err(e) => {
                warn!(pipe = self.definition.name(), error = %e, "transform failed, skipping record");
                return Ok(());
            }
        };

        for output in outputs {
            self.router.transit_output(output).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl Component for Pipe {
    fn component_type(&self) -> ComponentType {
        ComponentType::Pipe
    }

    async fn event_loop(&self) -> Result<()> {
        let mut input = self
            .input
            .try_lock()
            .map_err(|_| PipelineError::AlreadyRunning)?;

        info!(
            pipe = self.definition.name(),
            directive_count = self.router.directive_count(),
            "pipe starting"
        );

        let result = loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break Ok(()),
                record = input.recv() => match record {
                    Some(data) => match self.process(data).await {
                        Ok(()) => {}
                        Err(PipelineError::ShuttingDown) => break Ok(()),
                        Err(e) => break Err(e),
                    },
                    None => {
                        debug!(pipe = self.definition.name(), "pipe input closed");
                        break Ok(());
                    }
                },
            }
        };

        self.router.close();
        result
    }

    fn add_directive(&self, id: DirectiveId, sender: mpsc::Sender<TransitData>) -> Result<()> {
        self.router.add_directive(id, sender)
    }

    async fn close(&self) {
        // The loop runs on the caller's task; nothing of our own to join
        debug!(pipe = self.definition.name(), "pipe closed");
    }
}

impl std::fmt::Debug for Pipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipe")
            .field("name", &self.definition.name())
            .field("router", &self.router)
            .finish()
    }
}
