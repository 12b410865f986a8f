//! Fixed-capacity non-blocking queues.
//!
//! Producers never block: `try_push` fails immediately at capacity so the
//! driver-context producer can drop-with-counter instead of stalling the
//! radio stack. Only the outbound worker ever waits, via `wait_nonempty`.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use tracing::trace;

/// Bounded FIFO safe for cross-context single-producer/single-consumer use.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    items: Mutex<VecDeque<T>>,
    nonempty: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue whose capacity is fixed for its lifetime.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            nonempty: Condvar::new(),
            capacity,
        }
    }

    /// Append to the tail; returns the item back when the queue is full.
    pub fn try_push(&self, item: T) -> std::result::Result<(), T> {
        let mut items = self.items.lock().expect("queue mutex poisoned");
        if items.len() >= self.capacity {
            trace!(capacity = self.capacity, "queue full, rejecting push");
            return Err(item);
        }
        items.push_back(item);
        drop(items);
        self.nonempty.notify_one();
        Ok(())
    }

    /// Append to the tail unconditionally.
    ///
    /// Reserved for the consumer re-queueing an item whose earlier pop
    /// freed a slot: if a producer claimed that slot in the meantime the
    /// queue transiently holds one item over capacity, rather than the
    /// consumer losing the item.
    pub fn force_push(&self, item: T) {
        let mut items = self.items.lock().expect("queue mutex poisoned");
        items.push_back(item);
        drop(items);
        self.nonempty.notify_one();
    }

    /// Pop from the head without waiting.
    pub fn try_pop(&self) -> Option<T> {
        self.items
            .lock()
            .expect("queue mutex poisoned")
            .pop_front()
    }

    /// Block until the queue is non-empty or `timeout` elapses. Used only by
    /// the outbound worker; returns whether items are available.
    pub fn wait_nonempty(&self, timeout: Duration) -> bool {
        let items = self.items.lock().expect("queue mutex poisoned");
        if !items.is_empty() {
            return true;
        }
        let (items, _) = self
            .nonempty
            .wait_timeout(items, timeout)
            .expect("queue mutex poisoned");
        !items.is_empty()
    }

    /// Sleep on the queue's condvar for up to `timeout` regardless of the
    /// queue's contents. Any push or [`Self::wake`] ends the wait early.
    /// Lets a suspended consumer idle without polling a non-empty queue.
    pub fn park(&self, timeout: Duration) {
        let items = self.items.lock().expect("queue mutex poisoned");
        let _unused = self
            .nonempty
            .wait_timeout(items, timeout)
            .expect("queue mutex poisoned");
    }

    /// Wake a consumer blocked in [`Self::wait_nonempty`] or [`Self::park`]
    /// (used on unlock and teardown).
    pub fn wake(&self) {
        self.nonempty.notify_all();
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().expect("queue mutex poisoned").len()
    }

    /// Whether the queue holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the queue is at capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Capacity fixed at construction.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Discard all queued items (teardown).
    pub fn clear(&self) {
        self.items.lock().expect("queue mutex poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let queue = BoundedQueue::new(4);
        queue.try_push(1).unwrap();
        queue.try_push(2).unwrap();
        assert_eq!(queue.try_pop(), Some(1));
        assert_eq!(queue.try_pop(), Some(2));
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn test_rejects_at_capacity() {
        let queue = BoundedQueue::new(2);
        queue.try_push(1).unwrap();
        queue.try_push(2).unwrap();
        assert!(queue.is_full());
        assert_eq!(queue.try_push(3), Err(3));

        // One drained slot admits the next push.
        assert_eq!(queue.try_pop(), Some(1));
        assert!(queue.try_push(3).is_ok());
    }

    #[test]
    fn test_wait_nonempty_sees_existing_items() {
        let queue = BoundedQueue::new(2);
        queue.try_push(7).unwrap();
        assert!(queue.wait_nonempty(Duration::from_millis(1)));
    }

    #[test]
    fn test_wait_nonempty_times_out() {
        let queue: BoundedQueue<u8> = BoundedQueue::new(2);
        assert!(!queue.wait_nonempty(Duration::from_millis(1)));
    }

    #[test]
    fn test_force_push_exceeds_capacity() {
        let queue = BoundedQueue::new(1);
        queue.try_push(1).unwrap();
        queue.force_push(2);
        assert_eq!(queue.len(), 2);
        assert!(queue.is_full());
        // Normal pushes still respect capacity.
        assert_eq!(queue.try_push(3), Err(3));
        assert_eq!(queue.try_pop(), Some(1));
        assert_eq!(queue.try_pop(), Some(2));
    }

    #[test]
    fn test_park_returns_after_timeout() {
        let queue = BoundedQueue::new(1);
        queue.try_push(1).unwrap();
        // Parks even while non-empty, unlike wait_nonempty.
        queue.park(Duration::from_millis(1));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_clear() {
        let queue = BoundedQueue::new(2);
        queue.try_push(1).unwrap();
        queue.clear();
        assert!(queue.is_empty());
    }
}
