//! Output router - directive-based fan-out
//!
//! Every component owns one `OutputRouter`. Records handed to
//! `transit_output` are delivered to all registered directives, waiting on
//! each one in turn, so a slow consumer stalls its producer.

use conduit_protocol::TransitData;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::directive::{Directive, DirectiveId};
use crate::error::{PipelineError, Result};

/// Fan-out of records to registered directives
///
/// # Design
///
/// - Directives live in a `RwLock<Vec<_>>`; registration may overlap with
///   delivery
/// - Delivery snapshots the directive set, then sends without holding the lock
/// - Each send also waits on the cancellation token, so teardown never
///   leaves a producer stuck on a consumer that stopped reading
/// - No rollback: a record interrupted mid fan-out may have reached only some
///   directives
///
/// # Example
///
/// ```ignore
/// let router = OutputRouter::new(cancel.clone());
///
/// let (tx, rx) = mpsc::channel(1);
/// router.add_directive(DirectiveId::new(0), tx)?;
///
/// router.transit_output(record).await?;
/// ```
pub struct OutputRouter {
    cancel: CancellationToken,
    directives: RwLock<Vec<Directive>>,
}

impl OutputRouter {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            directives: RwLock::new(Vec::new()),
        }
    }

    /// Register a destination
    ///
    /// The directive takes part in delivery of every record whose fan-out
    /// starts after this call returns.
    ///
    /// # Errors
    ///
    /// `InvalidDirective` if the receiving side is already closed.
    pub fn add_directive(&self, id: DirectiveId, sender: mpsc::Sender<TransitData>) -> Result<()> {
        if sender.is_closed() {
            return Err(PipelineError::InvalidDirective(id));
        }

        let mut directives = self.directives.write();
        directives.push(Directive::new(id, sender));

        tracing::debug!(
            directive = %id,
            directive_count = directives.len(),
            "registered directive with router"
        );

        Ok(())
    }

    /// Number of registered directives
    pub fn directive_count(&self) -> usize {
        self.directives.read().len()
    }

    /// Check if any directive is registered under `id`
    pub fn has_directive(&self, id: DirectiveId) -> bool {
        self.directives.read().iter().any(|d| d.id() == id)
    }

    /// Deliver a record to every registered directive
    ///
    /// Blocks on each directive until its receiver accepts the record.
    /// Directives whose receiver is gone are skipped.
    ///
    /// # Returns
    ///
    /// The number of directives the record was delivered to.
    ///
    /// # Errors
    ///
    /// `ShuttingDown` if cancellation fires while a send is pending.
    pub async fn transit_output(&self, data: TransitData) -> Result<usize> {
        let targets: Vec<(DirectiveId, mpsc::Sender<TransitData>)> = self
            .directives
            .read()
            .iter()
            .map(|d| (d.id(), d.sender().clone()))
            .collect();

        if targets.is_empty() {
            tracing::trace!(kind = data.value().kind(), "no directives registered, dropping record");
            return Ok(0);
        }

        let mut delivered = 0;

        for (id, sender) in targets {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::debug!(
                        directive = %id,
                        delivered,
                        "fan-out interrupted by shutdown"
                    );
                    return Err(PipelineError::ShuttingDown);
                }
                sent = sender.send(data.clone()) => match sent {
                    Ok(()) => delivered += 1,
                    Err(_) => {
                        tracing::warn!(directive = %id, "directive channel closed, skipping");
                    }
                },
            }
        }

        Ok(delivered)
    }

    /// Drop every directive sender
    ///
    /// Downstream receivers observe closure once any in-flight fan-out
    /// finishes. Returns how many directives were dropped.
    pub fn close(&self) -> usize {
        let dropped: Vec<Directive> = std::mem::take(&mut *self.directives.write());
        if !dropped.is_empty() {
            tracing::debug!(directive_count = dropped.len(), "router closed directives");
        }
        dropped.len()
    }
}

impl std::fmt::Debug for OutputRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputRouter")
            .field("directive_count", &self.directive_count())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
