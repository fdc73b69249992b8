//! Oracle - source reader component
//!
//! An `Oracle` drives a pluggable `OracleDefinition`. The definition's
//! reading routine runs on its own task and hands records over a private
//! channel; the oracle loop relays them to its `OutputRouter` until the
//! routine finishes or cancellation fires.
//!
//! # Lifecycle
//!
//! ```text
//! new() ──configure──► event_loop() ──cancel / routine done──► close()
//!          (dial)        spawn routine                           join tasks
//!                        relay records
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use conduit_config::{OracleConfig, OracleMode};
use conduit_protocol::{BlockHeight, ComponentType, TransitData};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use crate::component::Component;
use crate::directive::DirectiveId;
use crate::error::{PipelineError, Result};
use crate::router::OutputRouter;

/// Capacity of the channel between a reading routine and its oracle
///
/// One slot: the routine can run at most one record ahead of delivery.
pub const ORACLE_CHANNEL_SIZE: usize = 1;

/// Reading strategy plugged into an `Oracle`
///
/// The definition owns its reading state (e.g. the height cursor); only its
/// own routine mutates it.
#[async_trait]
pub trait OracleDefinition: Send {
    /// Prepare external resources; runs once before the oracle exists
    async fn configure_routine(&mut self) -> Result<()>;

    /// Open-ended reading, until cancelled or the configured end is reached
    async fn read_routine(
        &mut self,
        cancel: CancellationToken,
        out: mpsc::Sender<TransitData>,
    ) -> Result<()>;

    /// Bounded replay of `start..=end`; returns once `end` is emitted
    async fn backfill_routine(
        &mut self,
        cancel: CancellationToken,
        out: mpsc::Sender<TransitData>,
        start: BlockHeight,
        end: BlockHeight,
    ) -> Result<()>;
}

/// Which routine an oracle runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    Live,
    Backfill { start: BlockHeight, end: BlockHeight },
}

impl ReadMode {
    /// Resolve the read mode for a configuration
    ///
    /// # Errors
    ///
    /// `MissingBackfillRange` in backfill mode without both bounds.
    pub fn from_config(mode: OracleMode, cfg: &OracleConfig) -> Result<Self> {
        match mode {
            OracleMode::Live => Ok(Self::Live),
            OracleMode::Backfill => match (cfg.start_height, cfg.end_height) {
                (Some(start), Some(end)) => Ok(Self::Backfill { start, end }),
                _ => Err(PipelineError::MissingBackfillRange),
            },
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Backfill { .. } => "backfill",
        }
    }
}

/// Source reader component
pub struct Oracle {
    cancel: CancellationToken,
    mode: ReadMode,
    definition: Arc<Mutex<Box<dyn OracleDefinition>>>,
    router: OutputRouter,
    tasks: TaskTracker,
    running: AtomicBool,
}

impl Oracle {
    /// Create an oracle, running the definition's configure routine
    ///
    /// # Errors
    ///
    /// Any configure failure; no oracle is returned and nothing is retried.
    pub async fn new(
        cancel: CancellationToken,
        mode: ReadMode,
        mut definition: Box<dyn OracleDefinition>,
    ) -> Result<Self> {
        definition.configure_routine().await?;

        Ok(Self {
            router: OutputRouter::new(cancel.clone()),
            cancel,
            mode,
            definition: Arc::new(Mutex::new(definition)),
            tasks: TaskTracker::new(),
            running: AtomicBool::new(false),
        })
    }

    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    /// The oracle's output router
    pub fn router(&self) -> &OutputRouter {
        &self.router
    }

    fn spawn_routine(&self, tx: mpsc::Sender<TransitData>) {
        let definition = Arc::clone(&self.definition);
        let cancel = self.cancel.clone();
        let mode = self.mode;

        self.tasks.spawn(async move {
            let mut definition = definition.lock().await;
            let result = match mode {
                ReadMode::Live => definition.read_routine(cancel, tx).await,
                ReadMode::Backfill { start, end } => {
                    definition.backfill_routine(cancel, tx, start, end).await
                }
            };

            match result {
                Ok(()) => debug!(mode = mode.as_str(), "oracle routine finished"),
                Err(e) => error!(mode = mode.as_str(), error = %e, "oracle routine failed"),
            }
        });
    }
}

#[async_trait]
impl Component for Oracle {
    fn component_type(&self) -> ComponentType {
        ComponentType::Oracle
    }

    async fn event_loop(&self) -> Result<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(PipelineError::AlreadyRunning);
        }
        let _running = RunningGuard(&self.running);

        let (tx, mut rx) = mpsc::channel(ORACLE_CHANNEL_SIZE);
        self.spawn_routine(tx);

        info!(
            mode = self.mode.as_str(),
            directive_count = self.router.directive_count(),
            "oracle starting"
        );

        let result = loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    rx.close();
                    debug!("oracle cancelled");
                    break Ok(());
                }
                record = rx.recv() => match record {
                    Some(data) => match self.router.transit_output(data).await {
                        Ok(_) => {}
                        Err(PipelineError::ShuttingDown) => break Ok(()),
                        Err(e) => break Err(e),
                    },
                    None => break Ok(()),
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
        self.tasks.close();
        info!("waiting for oracle tasks");
        self.tasks.wait().await;
        info!("oracle tasks exited");
    }
}

/// Clears the running flag when the event loop returns or its future is dropped
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for Oracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Oracle")
            .field("mode", &self.mode)
            .field("router", &self.router)
            .field("tasks", &self.tasks.len())
            .finish()
    }
}
