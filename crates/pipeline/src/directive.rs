//! Directive registration
//!
//! A `Directive` pairs a caller-chosen `DirectiveId` with the sending half of
//! a downstream channel. The router holds directives; the downstream
//! component owns the matching receiver.

use std::fmt;

use conduit_protocol::TransitData;
use tokio::sync::mpsc;

/// Directive identifier
///
/// Opaque to the router: ids are neither validated nor deduplicated, and two
/// directives registered under the same id both receive every record.
///
/// # Example
///
/// ```
/// use conduit_pipeline::DirectiveId;
///
/// let id = DirectiveId::new(7);
/// let copy = id;
/// assert_eq!(id, copy);
/// assert_eq!(id.to_string(), "directive:7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirectiveId(u64);

impl DirectiveId {
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DirectiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "directive:{}", self.0)
    }
}

impl From<u64> for DirectiveId {
    #[inline]
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

/// A registered output destination
pub struct Directive {
    id: DirectiveId,
    sender: mpsc::Sender<TransitData>,
}

impl Directive {
    #[inline]
    pub fn new(id: DirectiveId, sender: mpsc::Sender<TransitData>) -> Self {
        Self { id, sender }
    }

    #[inline]
    pub fn id(&self) -> DirectiveId {
        self.id
    }

    /// Get a reference to the underlying sender
    #[inline]
    pub fn sender(&self) -> &mpsc::Sender<TransitData> {
        &self.sender
    }

    /// Send a record, waiting while the channel is full
    ///
    /// Returns the record back if the receiver is gone.
    #[inline]
    pub async fn send(&self, data: TransitData) -> Result<(), TransitData> {
        self.sender.send(data).await.map_err(|e| e.0)
    }

    /// Check if the receiving side has been dropped or closed
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Free slots in the channel right now
    #[inline]
    pub fn capacity(&self) -> usize {
        self.sender.capacity()
    }
}

impl fmt::Debug for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directive")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}
