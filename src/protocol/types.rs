//! Hardware addressing

use std::fmt;

/// 48-bit radio hardware address.
///
/// The driver hands addresses over as 6 raw bytes; internally they are kept
/// as the low 48 bits of a `u64` for cheap copying and comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress(u64);

const ADDR_MASK: u64 = 0xFFFF_FFFF_FFFF;

impl MacAddress {
    /// Reserved all-ones address meaning "all listening peers".
    pub const BROADCAST: Self = Self(ADDR_MASK);

    /// Construct from a raw 64-bit value; the upper 16 bits are discarded.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw & ADDR_MASK)
    }

    /// Construct from the 6 bytes reported by the radio driver
    /// (little-endian, first byte is the lowest octet).
    #[must_use]
    pub fn from_bytes(bytes: [u8; 6]) -> Self {
        let mut raw = [0u8; 8];
        raw[..6].copy_from_slice(&bytes);
        Self(u64::from_le_bytes(raw))
    }

    /// The 6-byte form expected by the radio driver.
    #[must_use]
    pub fn to_bytes(self) -> [u8; 6] {
        let raw = self.0.to_le_bytes();
        [raw[0], raw[1], raw[2], raw[3], raw[4], raw[5]]
    }

    /// Raw 48-bit value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Whether this is the broadcast sentinel.
    #[must_use]
    pub const fn is_broadcast(self) -> bool {
        self.0 == ADDR_MASK
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.to_bytes();
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        Self::from_bytes(bytes)
    }
}
