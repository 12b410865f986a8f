use std::sync::atomic::{AtomicU64, Ordering};

/// Track transport counters without external dependencies.
pub(crate) struct Metrics;

static FRAMES_SENT: AtomicU64 = AtomicU64::new(0);
static FRAMES_RECEIVED: AtomicU64 = AtomicU64::new(0);
static FRAMES_INVALID: AtomicU64 = AtomicU64::new(0);
static INBOUND_OVERFLOW: AtomicU64 = AtomicU64::new(0);
static RETRIES: AtomicU64 = AtomicU64::new(0);
static ABANDONED: AtomicU64 = AtomicU64::new(0);

/// Point-in-time copy of all counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MetricsSnapshot {
    pub frames_sent: u64,
    pub frames_received: u64,
    pub frames_invalid: u64,
    pub inbound_overflow: u64,
    pub retries: u64,
    pub abandoned: u64,
}

impl Metrics {
    pub(crate) fn record_sent() {
        FRAMES_SENT.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_received() {
        FRAMES_RECEIVED.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invalid() {
        FRAMES_INVALID.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_inbound_overflow() {
        INBOUND_OVERFLOW.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retry() {
        RETRIES.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_abandoned() {
        ABANDONED.fetch_add(1, Ordering::Relaxed);
    }

    #[allow(dead_code)]
    pub(crate) fn snapshot() -> MetricsSnapshot {
        MetricsSnapshot {
            frames_sent: FRAMES_SENT.load(Ordering::Relaxed),
            frames_received: FRAMES_RECEIVED.load(Ordering::Relaxed),
            frames_invalid: FRAMES_INVALID.load(Ordering::Relaxed),
            inbound_overflow: INBOUND_OVERFLOW.load(Ordering::Relaxed),
            retries: RETRIES.load(Ordering::Relaxed),
            abandoned: ABANDONED.load(Ordering::Relaxed),
        }
    }
}
