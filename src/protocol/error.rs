//! Frame-level error types

use thiserror::Error;

/// Errors raised while constructing or validating a frame.
#[derive(Error, Debug)]
pub enum Error {
    /// Received bytes do not start with the transport magic
    #[error("bad magic: expected c1:99:83, got {found:02x?}")]
    BadMagic {
        /// Leading bytes actually found
        found: [u8; 3],
    },

    /// Received buffer is shorter than the fixed header
    #[error("truncated frame: need at least {needed} bytes, got {got}")]
    Truncated {
        /// Minimum size for a valid frame
        needed: usize,
        /// Actual size
        got: usize,
    },

    /// Recomputed CRC16 differs from the one on the wire
    #[error("checksum mismatch: expected {expected:#06x}, got {found:#06x}")]
    ChecksumMismatch {
        /// Checksum recomputed from the received bytes
        expected: u16,
        /// Checksum carried by the frame
        found: u16,
    },

    /// Payload exceeds the per-frame maximum
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Payload size
        size: usize,
        /// Maximum allowed
        max: usize,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
