//! Little-endian CRC16 matching the radio vendor's convention.
//!
//! Bit-exact compatibility with other implementations on the same channel
//! requires this exact algorithm: reflected polynomial `0xA001`, seed
//! complemented on entry, result complemented on exit.

/// Compute the vendor CRC16 over `data`, seeded with `seed`.
#[must_use]
pub fn crc16_le(seed: u16, data: &[u8]) -> u16 {
    let mut crc = !seed;
    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xA001
            } else {
                crc >> 1
            };
        }
    }
    !crc
}
