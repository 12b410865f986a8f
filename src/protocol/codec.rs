//! Frame codec (encode/parse)
//!
//! Explicit byte-offset serialization against the fixed wire layout; no
//! reliance on in-memory struct layout.

use bytes::Bytes;

use super::{Error, Frame, HEADER_SIZE, MAGIC, MAX_FRAME_SIZE, MacAddress, Result};

/// Encode a frame to bytes.
///
/// # Format
///
/// ```text
/// [MAGIC (3)] [APP ID (4, LE)] [REF ID (1)] [CRC16 (2, LE)] [PAYLOAD (≤240)]
/// ```
#[must_use]
pub fn encode(frame: &Frame) -> Vec<u8> {
    let payload = frame.payload();
    let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());

    bytes.extend_from_slice(&MAGIC);
    bytes.extend_from_slice(&frame.app_id().to_le_bytes());
    bytes.push(frame.ref_id());
    bytes.extend_from_slice(&frame.checksum().to_le_bytes());
    bytes.extend_from_slice(payload);

    bytes
}

/// Parse and validate a received frame.
///
/// `address` and `signal_quality` come from the driver's receive metadata;
/// they are not on the wire.
///
/// # Errors
///
/// Returns an error if:
/// - Fewer than the 10 header bytes are present
/// - The buffer exceeds the radio's frame ceiling
/// - The magic does not match
/// - The CRC16 does not match a recomputation
pub fn parse(address: MacAddress, bytes: &[u8], signal_quality: u8) -> Result<Frame> {
    if bytes.len() < HEADER_SIZE {
        return Err(Error::Truncated {
            needed: HEADER_SIZE,
            got: bytes.len(),
        });
    }
    if bytes.len() > MAX_FRAME_SIZE {
        return Err(Error::PayloadTooLarge {
            size: bytes.len() - HEADER_SIZE,
            max: MAX_FRAME_SIZE - HEADER_SIZE,
        });
    }

    if bytes[0..3] != MAGIC {
        return Err(Error::BadMagic {
            found: [bytes[0], bytes[1], bytes[2]],
        });
    }

    let app_id = u32::from_le_bytes(bytes[3..7].try_into().unwrap());
    let ref_id = bytes[7];
    let wire_checksum = u16::from_le_bytes(bytes[8..10].try_into().unwrap());
    let payload = &bytes[HEADER_SIZE..];

    let computed = Frame::compute_checksum(ref_id, payload);
    if computed != wire_checksum {
        return Err(Error::ChecksumMismatch {
            expected: computed,
            found: wire_checksum,
        });
    }

    Ok(Frame::received(
        address,
        app_id,
        ref_id,
        wire_checksum,
        Bytes::copy_from_slice(payload),
        signal_quality,
    ))
}
