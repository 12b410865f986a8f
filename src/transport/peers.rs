//! Peer address table bridging to the driver's registration capability.

use std::sync::Arc;

use tracing::debug;

use super::radio::{RadioDriver, RadioError};
use super::{Result, TransportError};
use crate::protocol::MacAddress;

/// Ordered set of known peer addresses.
///
/// The broadcast sentinel is never stored: it is always a legal destination
/// without registration. The local address is likewise excluded. Mutation
/// happens only on engine-owned execution paths, so no interior locking is
/// needed here.
pub struct PeerTable {
    radio: Arc<dyn RadioDriver>,
    self_addr: MacAddress,
    peers: Vec<MacAddress>,
}

impl PeerTable {
    /// Create an empty table for the given local address.
    pub fn new(radio: Arc<dyn RadioDriver>, self_addr: MacAddress) -> Self {
        Self {
            radio,
            self_addr,
            peers: Vec::new(),
        }
    }

    /// Register `addr` with the radio driver and record it.
    ///
    /// Idempotent: an already-known address, the local address, and the
    /// broadcast sentinel are all no-op successes.
    pub fn add(&mut self, addr: MacAddress) -> Result<()> {
        if addr.is_broadcast() || addr == self.self_addr || self.contains(addr) {
            return Ok(());
        }

        match self.radio.add_peer(addr) {
            Ok(()) => {
                debug!(peer = %addr, "peer registered");
                self.peers.push(addr);
                Ok(())
            }
            Err(RadioError::Capacity) => Err(TransportError::PeerTableFull { peer: addr }),
            Err(err) => Err(err.into()),
        }
    }

    /// Unregister `addr` and drop it from the table. Removing an address
    /// that was never added is a no-op success.
    pub fn remove(&mut self, addr: MacAddress) -> Result<()> {
        if addr.is_broadcast() {
            return Ok(());
        }
        let Some(index) = self.peers.iter().position(|&p| p == addr) else {
            return Ok(());
        };

        match self.radio.remove_peer(addr) {
            Ok(()) => {
                debug!(peer = %addr, "peer unregistered");
                self.peers.remove(index);
                Ok(())
            }
            // Table and driver disagree: drop our entry and surface it.
            Err(RadioError::NotFound) => {
                self.peers.remove(index);
                Err(TransportError::PeerNotFound { peer: addr })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Membership test.
    #[must_use]
    pub fn contains(&self, addr: MacAddress) -> bool {
        self.peers.contains(&addr)
    }

    /// Number of registered peers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Registered addresses in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = MacAddress> + '_ {
        self.peers.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeRadio {
        registered: Mutex<Vec<MacAddress>>,
        capacity: usize,
    }

    impl FakeRadio {
        fn new(capacity: usize) -> Arc<Self> {
            Arc::new(Self {
                registered: Mutex::new(Vec::new()),
                capacity,
            })
        }
    }

    impl RadioDriver for FakeRadio {
        fn send(&self, _peer: MacAddress, _payload: &[u8]) -> std::result::Result<(), RadioError> {
            Ok(())
        }

        fn add_peer(&self, peer: MacAddress) -> std::result::Result<(), RadioError> {
            let mut registered = self.registered.lock().unwrap();
            if registered.len() >= self.capacity {
                return Err(RadioError::Capacity);
            }
            registered.push(peer);
            Ok(())
        }

        fn remove_peer(&self, peer: MacAddress) -> std::result::Result<(), RadioError> {
            let mut registered = self.registered.lock().unwrap();
            match registered.iter().position(|&p| p == peer) {
                Some(index) => {
                    registered.remove(index);
                    Ok(())
                }
                None => Err(RadioError::NotFound),
            }
        }
    }

    fn addr(n: u64) -> MacAddress {
        MacAddress::new(n)
    }

    #[test]
    fn test_add_and_contains() {
        let radio = FakeRadio::new(20);
        let mut table = PeerTable::new(radio.clone(), addr(1));
        table.add(addr(2)).unwrap();
        assert!(table.contains(addr(2)));
        assert_eq!(radio.registered.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_add_idempotent() {
        let radio = FakeRadio::new(20);
        let mut table = PeerTable::new(radio.clone(), addr(1));
        table.add(addr(2)).unwrap();
        table.add(addr(2)).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(radio.registered.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_self_and_broadcast_never_stored() {
        let radio = FakeRadio::new(20);
        let mut table = PeerTable::new(radio, addr(1));
        table.add(addr(1)).unwrap();
        table.add(MacAddress::BROADCAST).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_capacity_error() {
        let radio = FakeRadio::new(1);
        let mut table = PeerTable::new(radio, addr(1));
        table.add(addr(2)).unwrap();
        assert!(matches!(
            table.add(addr(3)),
            Err(TransportError::PeerTableFull { .. })
        ));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let radio = FakeRadio::new(20);
        let mut table = PeerTable::new(radio, addr(1));
        table.remove(addr(9)).unwrap();
    }

    #[test]
    fn test_remove() {
        let radio = FakeRadio::new(20);
        let mut table = PeerTable::new(radio.clone(), addr(1));
        table.add(addr(2)).unwrap();
        table.remove(addr(2)).unwrap();
        assert!(!table.contains(addr(2)));
        assert!(radio.registered.lock().unwrap().is_empty());
    }
}
