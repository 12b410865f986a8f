//! Transport engine: bounded queues, retry worker, peer table, and
//! sub-protocol dispatch.

mod engine;
mod error;
mod events;
mod peers;
mod queue;
mod radio;
mod registry;

pub use engine::{Engine, EngineConfig};
pub use error::TransportError;
pub use events::DefaultProtocol;
pub use peers::PeerTable;
pub use queue::BoundedQueue;
pub use radio::{RadioDriver, RadioError};
pub use registry::{ProtocolRegistry, ReferenceCounter, SubProtocol};

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
