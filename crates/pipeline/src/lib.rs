//! Conduit Pipeline
//!
//! Component runtime: output routing, the oracle source reader and the
//! generic transform pipe.
//!
//! # Architecture
//!
//! ```text
//!  [OracleDefinition]          [Oracle]               [Pipe]
//!   read / backfill ──mpsc(1)──► relay ──directives──► transform ──directives──► consumers
//!   routine task                OutputRouter          OutputRouter
//! ```
//!
//! # Key Design
//!
//! - **One cancellation token**: every component observes the same
//!   `CancellationToken`; each loop selects between its input and the token
//! - **Blocking fan-out**: `OutputRouter::transit_output` waits on every
//!   directive, so backpressure propagates up to the reading routine
//! - **Cascading close**: when a loop returns, its router drops all directive
//!   senders and downstream loops see their input close
//! - **Join point**: `Component::close` waits for spawned tasks and may be
//!   called repeatedly
//!
//! # Example
//!
//! ```ignore
//! let oracle = Oracle::new(cancel.clone(), ReadMode::Live, definition).await?;
//!
//! let (tx, rx) = mpsc::channel(1);
//! oracle.add_directive(DirectiveId::new(0), tx)?;
//!
//! let pipe = Pipe::new(cancel.clone(), rx, Box::new(MyTransform));
//! ```

mod component;
mod directive;
mod error;
mod factory;
mod oracle;
mod pipe;
mod retry;
mod router;

pub use component::Component;
pub use directive::{Directive, DirectiveId};
pub use error::{PipelineError, Result};
pub use factory::{OracleFactory, PipeFactory};
pub use oracle::{ORACLE_CHANNEL_SIZE, Oracle, OracleDefinition, ReadMode};
pub use pipe::{Pipe, PipeDefinition};
pub use retry::{RetryPolicy, execute_with_retry};
pub use router::OutputRouter;

// Re-export key types from dependencies for convenience
pub use conduit_protocol::{ComponentType, TransitData};
pub use tokio_util::sync::CancellationToken;

#[cfg(test)]
mod oracle_test;
