//! Sub-protocol capability and dispatch-by-application-id registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::trace;

use super::{Result, TransportError};
use crate::protocol::Frame;

/// An independently registered handler for frames of one application id.
///
/// Callbacks default to no-ops so implementations only override what they
/// use. They are invoked from engine-owned execution paths (the inbound
/// poll step and the outbound worker) and must not block.
pub trait SubProtocol: Send + Sync {
    /// The 32-bit application id this handler owns.
    fn application_id(&self) -> u32;

    /// A validated frame for this application id arrived.
    fn on_receive(&self, frame: &Frame) {
        let _ = frame;
    }

    /// An outbound frame reached a terminal state: acknowledged (`true`) or
    /// abandoned after retry exhaustion (`false`).
    fn on_sent(&self, frame: &Frame, success: bool) {
        let _ = (frame, success);
    }

    /// A frame arrived from a sender that was just auto-added to the peer
    /// table; fires before `on_receive` for the same frame.
    fn on_new_peer(&self, frame: &Frame) {
        let _ = frame;
    }
}

/// Rolling per-sender reference id counter.
///
/// Wraps silently at 256; receivers must only assume short-window
/// monotonicity per sender, never global uniqueness.
#[derive(Debug, Default)]
pub struct ReferenceCounter(AtomicU8);

impl ReferenceCounter {
    /// A counter starting at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    /// The next reference id.
    pub fn next(&self) -> u8 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// Mapping from application id to its registered sub-protocol.
#[derive(Default)]
pub struct ProtocolRegistry {
    protocols: HashMap<u32, Arc<dyn SubProtocol>>,
}

impl ProtocolRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sub-protocol under its own application id.
    ///
    /// A second registration for the same id is rejected rather than
    /// silently overwriting: sub-protocols are authored independently and
    /// an id collision would otherwise route frames to the wrong handler
    /// without any observable signal.
    pub fn register(&mut self, protocol: Arc<dyn SubProtocol>) -> Result<()> {
        let app_id = protocol.application_id();
        if self.protocols.contains_key(&app_id) {
            return Err(TransportError::DuplicateApplicationId { app_id });
        }
        self.protocols.insert(app_id, protocol);
        Ok(())
    }

    /// Look up the handler for an application id.
    #[must_use]
    pub fn get(&self, app_id: u32) -> Option<&Arc<dyn SubProtocol>> {
        self.protocols.get(&app_id)
    }

    /// Route a received frame to its handler. Frames for unregistered
    /// application ids are expected on a shared channel and dropped without
    /// error.
    pub fn dispatch_receive(&self, frame: &Frame) {
        match self.protocols.get(&frame.app_id()) {
            Some(protocol) => protocol.on_receive(frame),
            None => trace!(app_id = frame.app_id(), "no handler, frame dropped"),
        }
    }

    /// Route a terminal send outcome to the owning handler.
    pub fn dispatch_sent(&self, frame: &Frame, success: bool) {
        match self.protocols.get(&frame.app_id()) {
            Some(protocol) => protocol.on_sent(frame, success),
            None => trace!(app_id = frame.app_id(), "no handler for sent frame"),
        }
    }

    /// Route a new-peer notification to the owning handler.
    pub fn dispatch_new_peer(&self, frame: &Frame) {
        match self.protocols.get(&frame.app_id()) {
            Some(protocol) => protocol.on_new_peer(frame),
            None => trace!(app_id = frame.app_id(), "no handler for new peer"),
        }
    }

    /// Number of registered sub-protocols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    /// Whether no sub-protocols are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MacAddress;
    use std::sync::atomic::AtomicUsize;

    struct CountingProtocol {
        app_id: u32,
        received: AtomicUsize,
    }

    impl CountingProtocol {
        fn new(app_id: u32) -> Arc<Self> {
            Arc::new(Self {
                app_id,
                received: AtomicUsize::new(0),
            })
        }
    }

    impl SubProtocol for CountingProtocol {
        fn application_id(&self) -> u32 {
            self.app_id
        }

        fn on_receive(&self, _frame: &Frame) {
            self.received.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn frame(app_id: u32) -> Frame {
        Frame::new(MacAddress::new(0x2), app_id, 0, b"x".as_slice()).unwrap()
    }

    #[test]
    fn test_dispatch_by_app_id() {
        let mut registry = ProtocolRegistry::new();
        let a = CountingProtocol::new(0x10);
        let b = CountingProtocol::new(0x20);
        registry.register(a.clone()).unwrap();
        registry.register(b.clone()).unwrap();

        registry.dispatch_receive(&frame(0x10));
        assert_eq!(a.received.load(Ordering::SeqCst), 1);
        assert_eq!(b.received.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unknown_app_id_is_silent() {
        let registry = ProtocolRegistry::new();
        registry.dispatch_receive(&frame(0x99));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut registry = ProtocolRegistry::new();
        registry.register(CountingProtocol::new(0x10)).unwrap();
        assert!(matches!(
            registry.register(CountingProtocol::new(0x10)),
            Err(TransportError::DuplicateApplicationId { app_id: 0x10 })
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reference_counter_wraps() {
        let counter = ReferenceCounter::new();
        for expected in 0..=255u8 {
            assert_eq!(counter.next(), expected);
        }
        assert_eq!(counter.next(), 0);
    }
}
