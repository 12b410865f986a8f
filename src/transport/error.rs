//! Transport-level error types covering queueing, peer, and driver failures.

use thiserror::Error;

use super::radio::RadioError;
use crate::protocol;

/// Unified error type for transport operations.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Outbound queue is at capacity; the frame was not enqueued.
    #[error("outbound queue full ({capacity} frames pending)")]
    QueueFull {
        /// Queue capacity fixed at construction.
        capacity: usize,
    },

    /// Radio driver refused another peer registration.
    #[error("peer table full: driver rejected {peer}")]
    PeerTableFull {
        /// Address that could not be registered.
        peer: crate::protocol::MacAddress,
    },

    /// Driver reported an address it never had registered.
    #[error("peer not found: {peer}")]
    PeerNotFound {
        /// Address the driver did not recognize.
        peer: crate::protocol::MacAddress,
    },

    /// A sub-protocol with this application id is already registered.
    #[error("application id {app_id:#x} already registered")]
    DuplicateApplicationId {
        /// Conflicting application id.
        app_id: u32,
    },

    /// Frame construction or validation failure.
    #[error("frame error: {0}")]
    Frame(#[from] protocol::Error),

    /// Other radio driver failure.
    #[error("radio driver error: {0}")]
    Radio(#[from] RadioError),
}
