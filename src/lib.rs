//! nowlink - point-to-multipoint packet transport over a connectionless radio
//!
//! This library implements the framing, queueing, retry, and
//! protocol-multiplexing layer that sits between a short-range
//! connectionless radio driver (ESP-NOW style: ≤250-byte frames, 6-byte
//! hardware addresses, best-effort delivery) and independently registered
//! application sub-protocols sharing one channel.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use nowlink::{Engine, EngineConfig, MacAddress};
//! # struct NullRadio;
//! # impl nowlink::RadioDriver for NullRadio {
//! #     fn send(&self, _: MacAddress, _: &[u8]) -> Result<(), nowlink::RadioError> { Ok(()) }
//! #     fn add_peer(&self, _: MacAddress) -> Result<(), nowlink::RadioError> { Ok(()) }
//! #     fn remove_peer(&self, _: MacAddress) -> Result<(), nowlink::RadioError> { Ok(()) }
//! # }
//!
//! let radio = Arc::new(NullRadio);
//! let self_addr = MacAddress::from_bytes([0x24, 0x6f, 0x28, 0x00, 0x00, 0x01]);
//! let engine = Engine::new(EngineConfig::default(), radio, self_addr);
//! engine.start();
//!
//! // Build a frame through the built-in default sub-protocol and queue it.
//! let frame = engine
//!     .default_protocol()
//!     .frame(MacAddress::BROADCAST, b"hello".as_slice())?;
//! engine.send(frame)?;
//!
//! // Somewhere in the application's cooperative loop:
//! engine.poll();
//! # Ok::<(), nowlink::TransportError>(())
//! ```
//!
//! # Design
//!
//! - **Fixed wire format** - 10-byte header (magic, application id,
//!   reference id, CRC16) plus up to 240 payload bytes
//! - **Bounded queues** - radio callbacks only enqueue; all dispatch runs
//!   on engine-owned execution paths, never in driver context
//! - **Bounded retry** - failed sends re-enter the queue tail up to 7
//!   retries, then the frame is abandoned and its owner notified
//! - **Multi-tenant channel** - frames carry a 32-bit application id and
//!   are routed to independently registered sub-protocols

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod protocol;
pub mod transport;

pub use protocol::{
    DEFAULT_APP_ID, Error, Frame, HEADER_SIZE, MAGIC, MAX_PAYLOAD_SIZE, MacAddress, Result,
};
pub use transport::{
    DefaultProtocol, Engine, EngineConfig, RadioDriver, RadioError, SubProtocol, TransportError,
};

/// Protocol version
pub const VERSION: &str = "1.0.0";
