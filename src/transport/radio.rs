//! Radio driver capability boundary.
//!
//! The transport treats the radio as an opaque collaborator: `send` only
//! initiates a transmission, with the outcome reported later through
//! [`crate::Engine::on_radio_send_complete`]; received frames arrive through
//! [`crate::Engine::on_radio_received`]. Both entry points are expected to
//! be called from the driver's own constrained execution context.

use thiserror::Error;

use crate::protocol::MacAddress;

/// Errors surfaced by the radio driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RadioError {
    /// Driver's peer table is at its capacity limit.
    #[error("driver peer capacity exhausted")]
    Capacity,

    /// Address was not registered with the driver.
    #[error("address not registered with driver")]
    NotFound,

    /// Driver cannot accept another transmission right now.
    #[error("driver busy")]
    Busy,

    /// Other driver failure.
    #[error("driver error: {0}")]
    Io(String),
}

/// The radio primitive this transport is built on.
///
/// Implementations wrap the vendor stack (or a simulation of it). All
/// methods must be non-blocking: `send` queues a transmission and returns,
/// it never waits for the completion callback.
pub trait RadioDriver: Send + Sync {
    /// Initiate transmission of `payload` (≤250 bytes) to `peer`.
    fn send(&self, peer: MacAddress, payload: &[u8]) -> std::result::Result<(), RadioError>;

    /// Register `peer` for direct sends.
    fn add_peer(&self, peer: MacAddress) -> std::result::Result<(), RadioError>;

    /// Unregister `peer`.
    fn remove_peer(&self, peer: MacAddress) -> std::result::Result<(), RadioError>;
}
