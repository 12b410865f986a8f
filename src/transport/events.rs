//! Built-in default sub-protocol with subscribable event callbacks.

use std::sync::Mutex;

use bytes::Bytes;

use super::registry::{ReferenceCounter, SubProtocol};
use crate::protocol::{DEFAULT_APP_ID, Frame, MacAddress, Result};

type ReceiveCallback = Box<dyn Fn(&Frame) + Send + Sync>;
type SentCallback = Box<dyn Fn(&Frame, bool) + Send + Sync>;

/// The sub-protocol registered by every engine under [`DEFAULT_APP_ID`].
///
/// It exposes the three handler callbacks as subscribable streams so an
/// automation layer can react to raw transport events without defining its
/// own sub-protocol. Subscribers run in registration order on engine-owned
/// execution paths and must not block.
#[derive(Default)]
pub struct DefaultProtocol {
    ref_ids: ReferenceCounter,
    on_receive: Mutex<Vec<ReceiveCallback>>,
    on_sent: Mutex<Vec<SentCallback>>,
    on_new_peer: Mutex<Vec<ReceiveCallback>>,
}

impl DefaultProtocol {
    /// A default protocol with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an outbound frame carrying this protocol's application id and
    /// its next rolling reference id.
    pub fn frame(&self, dest: MacAddress, payload: impl Into<Bytes>) -> Result<Frame> {
        Frame::new(dest, DEFAULT_APP_ID, self.ref_ids.next(), payload)
    }

    /// The next reference id (advances the counter).
    pub fn next_reference_id(&self) -> u8 {
        self.ref_ids.next()
    }

    /// Subscribe to received frames.
    pub fn subscribe_receive(&self, callback: impl Fn(&Frame) + Send + Sync + 'static) {
        self.on_receive
            .lock()
            .expect("subscriber mutex poisoned")
            .push(Box::new(callback));
    }

    /// Subscribe to terminal send outcomes.
    pub fn subscribe_sent(&self, callback: impl Fn(&Frame, bool) + Send + Sync + 'static) {
        self.on_sent
            .lock()
            .expect("subscriber mutex poisoned")
            .push(Box::new(callback));
    }

    /// Subscribe to auto-added-peer notifications.
    pub fn subscribe_new_peer(&self, callback: impl Fn(&Frame) + Send + Sync + 'static) {
        self.on_new_peer
            .lock()
            .expect("subscriber mutex poisoned")
            .push(Box::new(callback));
    }
}

impl SubProtocol for DefaultProtocol {
    fn application_id(&self) -> u32 {
        DEFAULT_APP_ID
    }

    fn on_receive(&self, frame: &Frame) {
        for callback in self.on_receive.lock().expect("subscriber mutex poisoned").iter() {
            callback(frame);
        }
    }

    fn on_sent(&self, frame: &Frame, success: bool) {
        for callback in self.on_sent.lock().expect("subscriber mutex poisoned").iter() {
            callback(frame, success);
        }
    }

    fn on_new_peer(&self, frame: &Frame) {
        for callback in self.on_new_peer.lock().expect("subscriber mutex poisoned").iter() {
            callback(frame);
        }
    }
}
