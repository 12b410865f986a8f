//! Wire format core: frame layout, addressing, integrity check, and codec.

mod codec;
mod crc;
mod error;
mod frame;
pub(crate) mod metrics;
mod types;

pub use codec::{encode, parse};
pub use crc::crc16_le;
pub use error::{Error, Result};
pub use frame::{Frame, MAX_RETRIES};
pub use types::MacAddress;

/// Frame magic: identifies this transport on the shared radio channel.
pub const MAGIC: [u8; 3] = [0xC1, 0x99, 0x83];

/// Maximum payload size per frame (radio frame ceiling minus the header).
pub const MAX_PAYLOAD_SIZE: usize = 240;

/// Header size in bytes: magic (3) + application id (4) + reference id (1)
/// + CRC16 (2).
pub const HEADER_SIZE: usize = 10;

/// Maximum serialized frame size, matching the radio's hard payload limit.
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE;

/// Application id owned by the built-in default sub-protocol.
pub const DEFAULT_APP_ID: u32 = 0x0011_CFAF;
