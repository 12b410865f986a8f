//! Frame value type

use std::time::Instant;

use bytes::Bytes;

use super::{Error, MAX_PAYLOAD_SIZE, MacAddress, Result, crc::crc16_le};

/// Retry ceiling: `retry_count` saturates here and never wraps.
pub const MAX_RETRIES: u8 = 7;

/// A single transport frame.
///
/// Frames are value types: each queue entry is an independent copy, and the
/// payload is an immutable [`Bytes`] buffer so cloning is cheap. The
/// `address`, retry count, broadcast flag, signal quality, and arrival time
/// are in-memory metadata and never serialized; the wire layout is owned by
/// [`super::encode`] / [`super::parse`].
#[derive(Debug, Clone)]
pub struct Frame {
    /// Peer this frame arrived from (inbound) or is destined for (outbound).
    address: MacAddress,
    app_id: u32,
    ref_id: u8,
    checksum: u16,
    payload: Bytes,
    retry_count: u8,
    is_broadcast: bool,
    signal_quality: u8,
    arrival_timestamp: Option<Instant>,
}

impl Frame {
    /// Create an outbound frame; computes the checksum at construction.
    pub fn new(
        address: MacAddress,
        app_id: u32,
        ref_id: u8,
        payload: impl Into<Bytes>,
    ) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }

        let mut frame = Self {
            address,
            app_id,
            ref_id,
            checksum: 0,
            payload,
            retry_count: 0,
            is_broadcast: address.is_broadcast(),
            signal_quality: 0,
            arrival_timestamp: None,
        };
        frame.recompute_checksum();
        Ok(frame)
    }

    /// Reassemble a frame parsed off the air. Checksum validation happens in
    /// [`super::parse`]; this stamps the receive metadata.
    pub(crate) fn received(
        address: MacAddress,
        app_id: u32,
        ref_id: u8,
        checksum: u16,
        payload: Bytes,
        signal_quality: u8,
    ) -> Self {
        Self {
            address,
            app_id,
            ref_id,
            checksum,
            payload,
            retry_count: 0,
            is_broadcast: address.is_broadcast(),
            signal_quality,
            arrival_timestamp: Some(Instant::now()),
        }
    }

    /// Peer address (sender for inbound frames, destination for outbound).
    #[must_use]
    pub const fn address(&self) -> MacAddress {
        self.address
    }

    /// Application id routing this frame to its sub-protocol.
    #[must_use]
    pub const fn app_id(&self) -> u32 {
        self.app_id
    }

    /// Sender-assigned rolling reference id.
    #[must_use]
    pub const fn ref_id(&self) -> u8 {
        self.ref_id
    }

    /// CRC16 carried by (or computed for) this frame.
    #[must_use]
    pub const fn checksum(&self) -> u16 {
        self.checksum
    }

    /// Payload bytes.
    #[must_use]
    pub const fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Number of retransmission attempts so far.
    #[must_use]
    pub const fn retry_count(&self) -> u8 {
        self.retry_count
    }

    /// Whether this frame targets the broadcast address.
    #[must_use]
    pub const fn is_broadcast(&self) -> bool {
        self.is_broadcast
    }

    /// Radio-reported signal quality for a received frame (0 otherwise).
    #[must_use]
    pub const fn signal_quality(&self) -> u8 {
        self.signal_quality
    }

    /// When this frame was pulled off the air, if it was received.
    #[must_use]
    pub const fn arrival_timestamp(&self) -> Option<Instant> {
        self.arrival_timestamp
    }

    /// Recompute the CRC16 over `[ref_id] ++ payload`, seeded with the
    /// reference id. Idempotent: identical inputs always yield the same
    /// checksum.
    pub fn recompute_checksum(&mut self) -> u16 {
        self.checksum = Self::compute_checksum(self.ref_id, &self.payload);
        self.checksum
    }

    /// Checksum as it would appear on the wire for the given inputs.
    #[must_use]
    pub(crate) fn compute_checksum(ref_id: u8, payload: &[u8]) -> u16 {
        let mut covered = Vec::with_capacity(1 + payload.len());
        covered.push(ref_id);
        covered.extend_from_slice(payload);
        crc16_le(u16::from(ref_id), &covered)
    }

    /// Bump the retry counter, saturating at [`MAX_RETRIES`].
    pub fn increment_retry(&mut self) {
        if self.retry_count < MAX_RETRIES {
            self.retry_count += 1;
        }
    }

    /// Whether the retry budget is exhausted.
    #[must_use]
    pub const fn retries_exhausted(&self) -> bool {
        self.retry_count >= MAX_RETRIES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction() {
        let frame = Frame::new(MacAddress::new(0x1), 0x42, 7, b"abc".as_slice()).unwrap();
        assert_eq!(frame.app_id(), 0x42);
        assert_eq!(frame.ref_id(), 7);
        assert_eq!(frame.payload().as_ref(), b"abc");
        assert_eq!(frame.retry_count(), 0);
        assert!(!frame.is_broadcast());
        assert!(frame.arrival_timestamp().is_none());
    }

    #[test]
    fn test_broadcast_flag() {
        let frame = Frame::new(MacAddress::BROADCAST, 1, 0, Bytes::new()).unwrap();
        assert!(frame.is_broadcast());
    }

    #[test]
    fn test_payload_too_large() {
        let payload = vec![0u8; MAX_PAYLOAD_SIZE + 1];
        let result = Frame::new(MacAddress::new(0x1), 1, 0, payload);
        assert!(matches!(result, Err(Error::PayloadTooLarge { size: 241, .. })));
    }

    #[test]
    fn test_max_payload_accepted() {
        let payload = vec![0u8; MAX_PAYLOAD_SIZE];
        assert!(Frame::new(MacAddress::new(0x1), 1, 0, payload).is_ok());
    }

    #[test]
    fn test_checksum_idempotent() {
        let mut frame = Frame::new(MacAddress::new(0x1), 1, 5, b"xy".as_slice()).unwrap();
        let first = frame.checksum();
        assert_eq!(frame.recompute_checksum(), first);
        assert_eq!(frame.recompute_checksum(), first);
    }

    #[test]
    fn test_checksum_depends_on_ref_id() {
        let a = Frame::new(MacAddress::new(0x1), 1, 1, b"xy".as_slice()).unwrap();
        let b = Frame::new(MacAddress::new(0x1), 1, 2, b"xy".as_slice()).unwrap();
        assert_ne!(a.checksum(), b.checksum());
    }

    #[test]
    fn test_retry_saturates() {
        let mut frame = Frame::new(MacAddress::new(0x1), 1, 0, Bytes::new()).unwrap();
        for _ in 0..10 {
            frame.increment_retry();
        }
        assert_eq!(frame.retry_count(), MAX_RETRIES);
        assert!(frame.retries_exhausted());
    }
}
