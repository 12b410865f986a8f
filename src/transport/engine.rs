//! Transport engine: queue discipline, retry state machine, and dispatch.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, trace, warn};

use super::events::DefaultProtocol;
use super::peers::PeerTable;
use super::queue::BoundedQueue;
use super::radio::RadioDriver;
use super::registry::{ProtocolRegistry, SubProtocol};
use super::{Result, TransportError};
use crate::protocol::metrics::Metrics;
use crate::protocol::{Frame, MacAddress, encode, parse};

/// How long the worker sleeps when there is nothing to do before
/// re-checking the stop flag and the lock.
const WORKER_IDLE_WAIT: Duration = Duration::from_millis(20);

/// Engine configuration, consumed from the wiring layer.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Radio channel to operate on; 0 means "use the current channel".
    pub wifi_channel: u8,
    /// Add unknown senders to the peer table on first contact.
    pub auto_add_peer: bool,
    /// Wait for the driver's send-completion callback before issuing the
    /// next send. When `false` the engine is fire-and-forget: a frame the
    /// driver accepts is reported sent immediately and completions are
    /// ignored.
    pub use_sent_check: bool,
    /// Inbound queue capacity (driver-context producer).
    pub inbound_capacity: usize,
    /// Outbound queue capacity.
    pub outbound_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            wifi_channel: 0,
            auto_add_peer: false,
            use_sent_check: true,
            inbound_capacity: 10,
            outbound_capacity: 10,
        }
    }
}

/// Outbound tracking shared between the worker and the driver's
/// send-complete callback. At most one frame is in flight at a time.
#[derive(Default)]
struct InFlight {
    sending: Option<Frame>,
    completion: Option<(MacAddress, bool)>,
}

struct Shared {
    config: EngineConfig,
    radio: Arc<dyn RadioDriver>,
    inbound: BoundedQueue<Frame>,
    outbound: BoundedQueue<Frame>,
    registry: RwLock<ProtocolRegistry>,
    peers: Mutex<PeerTable>,
    default_protocol: Arc<DefaultProtocol>,
    in_flight: Mutex<InFlight>,
    completion_signal: Condvar,
    locked: AtomicBool,
    running: AtomicBool,
    inbound_dropped: AtomicU64,
}

/// The packet transport engine.
///
/// Owns the two bounded queues, the peer table, the protocol registry, and
/// the background worker that drains the outbound queue against the radio
/// driver with bounded retry. The driver calls
/// [`Engine::on_radio_received`] and [`Engine::on_radio_send_complete`]
/// from its own execution context; those entry points only enqueue or
/// record, never dispatch. All dispatch runs on engine-owned paths: the
/// worker (send outcomes) and [`Engine::poll`] (received frames).
pub struct Engine {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    /// Create an engine bound to a radio driver. A [`DefaultProtocol`] is
    /// registered automatically; call [`Engine::start`] to spawn the
    /// outbound worker.
    pub fn new(config: EngineConfig, radio: Arc<dyn RadioDriver>, self_addr: MacAddress) -> Self {
        debug!(
            channel = config.wifi_channel,
            auto_add_peer = config.auto_add_peer,
            use_sent_check = config.use_sent_check,
            "engine created"
        );

        let default_protocol = Arc::new(DefaultProtocol::new());
        let mut registry = ProtocolRegistry::new();
        registry
            .register(default_protocol.clone())
            .expect("default protocol registered on an empty registry");

        Self {
            shared: Arc::new(Shared {
                inbound: BoundedQueue::new(config.inbound_capacity),
                outbound: BoundedQueue::new(config.outbound_capacity),
                registry: RwLock::new(registry),
                peers: Mutex::new(PeerTable::new(radio.clone(), self_addr)),
                default_protocol,
                in_flight: Mutex::new(InFlight::default()),
                completion_signal: Condvar::new(),
                locked: AtomicBool::new(false),
                running: AtomicBool::new(false),
                inbound_dropped: AtomicU64::new(0),
                config,
                radio,
            }),
            worker: Mutex::new(None),
        }
    }

    /// Spawn the background worker that drains the outbound queue. Calling
    /// it while the worker is already running is a no-op.
    pub fn start(&self) {
        let mut worker = self.worker.lock().expect("worker handle mutex poisoned");
        if worker.is_some() {
            return;
        }
        self.shared.running.store(true, Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);
        *worker = Some(
            std::thread::Builder::new()
                .name("nowlink-outbound".into())
                .spawn(move || worker_loop(&shared))
                .expect("failed to spawn outbound worker"),
        );
    }

    /// Signal the worker to stop, join it, and discard both queues. Safe to
    /// call more than once; also called on drop.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.outbound.wake();
        self.shared.completion_signal.notify_all();

        let handle = self
            .worker
            .lock()
            .expect("worker handle mutex poisoned")
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }

        self.shared.outbound.clear();
        self.shared.inbound.clear();
        self.shared
            .in_flight
            .lock()
            .expect("in-flight mutex poisoned")
            .sending = None;
    }

    /// Enqueue a frame for transmission; returns immediately.
    ///
    /// Exactly one terminal [`SubProtocol::on_sent`] callback follows per
    /// accepted frame, unless the engine is stopped first.
    pub fn send(&self, frame: Frame) -> Result<()> {
        if self.shared.outbound.try_push(frame).is_err() {
            return Err(TransportError::QueueFull {
                capacity: self.shared.outbound.capacity(),
            });
        }
        Ok(())
    }

    /// Register a sub-protocol for its application id.
    pub fn register_sub_protocol(&self, protocol: Arc<dyn SubProtocol>) -> Result<()> {
        self.shared
            .registry
            .write()
            .expect("registry lock poisoned")
            .register(protocol)
    }

    /// The built-in default sub-protocol.
    #[must_use]
    pub fn default_protocol(&self) -> Arc<DefaultProtocol> {
        self.shared.default_protocol.clone()
    }

    /// Add a peer address to the table (and the driver).
    pub fn add_peer(&self, addr: MacAddress) -> Result<()> {
        self.shared
            .peers
            .lock()
            .expect("peer table mutex poisoned")
            .add(addr)
    }

    /// Remove a peer address from the table (and the driver).
    pub fn remove_peer(&self, addr: MacAddress) -> Result<()> {
        self.shared
            .peers
            .lock()
            .expect("peer table mutex poisoned")
            .remove(addr)
    }

    /// Whether `addr` is currently in the peer table.
    #[must_use]
    pub fn has_peer(&self, addr: MacAddress) -> bool {
        self.shared
            .peers
            .lock()
            .expect("peer table mutex poisoned")
            .contains(addr)
    }

    /// Frames waiting in the outbound queue.
    #[must_use]
    pub fn outbound_pending_count(&self) -> usize {
        self.shared.outbound.len()
    }

    /// Whether the outbound queue is at capacity.
    #[must_use]
    pub fn outbound_is_full(&self) -> bool {
        self.shared.outbound.is_full()
    }

    /// Whether the outbound queue is empty.
    #[must_use]
    pub fn outbound_is_empty(&self) -> bool {
        self.shared.outbound.is_empty()
    }

    /// Received frames dropped because the inbound queue was full.
    #[must_use]
    pub fn inbound_dropped(&self) -> u64 {
        self.shared.inbound_dropped.load(Ordering::Relaxed)
    }

    /// Suspend outbound draining. Advisory and cooperative: queued frames
    /// stay queued, the driver's inbound path is unaffected.
    pub fn lock(&self) {
        self.shared.locked.store(true, Ordering::SeqCst);
    }

    /// Resume outbound draining.
    pub fn unlock(&self) {
        self.shared.locked.store(false, Ordering::SeqCst);
        self.shared.outbound.wake();
    }

    /// Whether outbound draining is currently suspended.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.shared.locked.load(Ordering::SeqCst)
    }

    /// Driver entry point: a frame arrived off the air.
    ///
    /// Runs in the driver's constrained context: bounded-time validation
    /// and a non-blocking push. Invalid frames and inbound overflow are
    /// counted and dropped, never propagated.
    pub fn on_radio_received(&self, addr: MacAddress, bytes: &[u8], signal_quality: u8) {
        let frame = match parse(addr, bytes, signal_quality) {
            Ok(frame) => frame,
            Err(err) => {
                Metrics::record_invalid();
                trace!(peer = %addr, %err, "invalid frame dropped");
                return;
            }
        };

        if self.shared.inbound.try_push(frame).is_err() {
            self.shared.inbound_dropped.fetch_add(1, Ordering::Relaxed);
            Metrics::record_inbound_overflow();
            warn!(peer = %addr, "inbound queue full, frame dropped");
        }
    }

    /// Driver entry point: the outcome of the frame currently in flight.
    ///
    /// Only records the completion and wakes the worker; retry and dispatch
    /// run on the worker.
    pub fn on_radio_send_complete(&self, addr: MacAddress, success: bool) {
        let mut in_flight = self
            .shared
            .in_flight
            .lock()
            .expect("in-flight mutex poisoned");
        in_flight.completion = Some((addr, success));
        drop(in_flight);
        self.shared.completion_signal.notify_all();
    }

    /// Cooperative inbound step: drain the frames queued right now and
    /// dispatch each to its sub-protocol. Never blocks; call it from the
    /// application's periodic loop. Returns the number of frames processed.
    pub fn poll(&self) -> usize {
        let pending = self.shared.inbound.len();
        let mut processed = 0;

        for _ in 0..pending {
            let Some(frame) = self.shared.inbound.try_pop() else {
                break;
            };
            Metrics::record_received();
            self.dispatch_inbound(&frame);
            processed += 1;
        }

        processed
    }

    /// One non-blocking pass of the outbound state machine. The worker
    /// thread drives this continuously; hosts running their own scheduler
    /// may call it directly instead of [`Engine::start`]. Returns whether
    /// any progress was made.
    pub fn step_outbound(&self) -> bool {
        step_outbound(&self.shared)
    }

    fn dispatch_inbound(&self, frame: &Frame) {
        let sender = frame.address();
        // Clone the handler out so no registry guard is held across the
        // callbacks; a callback may itself register a sub-protocol.
        let handler = handler_for(&self.shared, frame.app_id());

        if self.shared.config.auto_add_peer && !sender.is_broadcast() {
            let mut peers = self.shared.peers.lock().expect("peer table mutex poisoned");
            if !peers.contains(sender) {
                match peers.add(sender) {
                    // add() no-ops for the local address; only a real
                    // insertion counts as a new peer.
                    Ok(()) if peers.contains(sender) => {
                        drop(peers);
                        debug!(peer = %sender, "auto-added peer");
                        if let Some(handler) = &handler {
                            handler.on_new_peer(frame);
                        }
                    }
                    Ok(()) => {}
                    Err(err) => {
                        warn!(peer = %sender, %err, "auto-add peer failed");
                    }
                }
            }
        }

        match &handler {
            Some(handler) => handler.on_receive(frame),
            None => trace!(app_id = frame.app_id(), "no handler, frame dropped"),
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(shared: &Arc<Shared>) {
    debug!("outbound worker started");
    while shared.running.load(Ordering::SeqCst) {
        if step_outbound(shared) {
            continue;
        }

        if shared.locked.load(Ordering::SeqCst) {
            // Draining is suspended: sleep on the queue's condvar, which
            // unlock() notifies, instead of polling the (possibly
            // non-empty) queue. The timeout keeps the stop flag
            // responsive.
            shared.outbound.park(WORKER_IDLE_WAIT);
            continue;
        }

        // Nothing actionable: wait for a completion if one is owed,
        // otherwise for new outbound work. Timeouts keep the stop flag
        // and the advisory lock responsive.
        let guard = shared.in_flight.lock().expect("in-flight mutex poisoned");
        if guard.sending.is_some() && guard.completion.is_none() {
            let _unused = shared
                .completion_signal
                .wait_timeout(guard, WORKER_IDLE_WAIT)
                .expect("in-flight mutex poisoned");
        } else {
            drop(guard);
            shared.outbound.wait_nonempty(WORKER_IDLE_WAIT);
        }
    }
    debug!("outbound worker stopped");
}

/// One pass of the outbound state machine:
/// `Queued → Sending → {Acknowledged | Retrying → Queued | Abandoned}`.
fn step_outbound(shared: &Arc<Shared>) -> bool {
    // Completions first, so the in-flight slot frees up before the next pop.
    let mut in_flight = shared.in_flight.lock().expect("in-flight mutex poisoned");
    if let Some((addr, success)) = in_flight.completion.take() {
        let matches = in_flight
            .sending
            .as_ref()
            .is_some_and(|frame| frame.address() == addr);
        if matches {
            let frame = in_flight.sending.take().expect("checked above");
            drop(in_flight);
            finish_send(shared, frame, success);
            return true;
        }
        // Fire-and-forget mode, or a stray completion for a frame this
        // engine is not tracking.
        trace!(peer = %addr, success, "ignoring uncorrelated send completion");
        drop(in_flight);
        return true;
    }
    if in_flight.sending.is_some() {
        // Still waiting on the driver's callback.
        return false;
    }
    drop(in_flight);

    if shared.locked.load(Ordering::SeqCst) {
        return false;
    }

    let Some(frame) = shared.outbound.try_pop() else {
        return false;
    };

    let bytes = encode(&frame);
    trace!(
        peer = %frame.address(),
        app_id = frame.app_id(),
        ref_id = frame.ref_id(),
        retry = frame.retry_count(),
        len = bytes.len(),
        "sending frame"
    );

    match shared.radio.send(frame.address(), &bytes) {
        Ok(()) => {
            if shared.config.use_sent_check {
                shared
                    .in_flight
                    .lock()
                    .expect("in-flight mutex poisoned")
                    .sending = Some(frame);
            } else {
                finish_send(shared, frame, true);
            }
        }
        Err(err) => {
            debug!(peer = %frame.address(), %err, "driver rejected send");
            finish_send(shared, frame, false);
        }
    }
    true
}

/// Look up and clone a sub-protocol handler so callbacks run without the
/// registry guard held (a callback may register another sub-protocol).
fn handler_for(shared: &Shared, app_id: u32) -> Option<Arc<dyn SubProtocol>> {
    shared
        .registry
        .read()
        .expect("registry lock poisoned")
        .get(app_id)
        .cloned()
}

/// Dispatch a terminal send outcome to the owning sub-protocol.
fn dispatch_sent(shared: &Shared, frame: &Frame, success: bool) {
    match handler_for(shared, frame.app_id()) {
        Some(handler) => handler.on_sent(frame, success),
        None => trace!(app_id = frame.app_id(), "no handler for sent frame"),
    }
}

/// Terminal or retry handling for a frame whose attempt just resolved.
fn finish_send(shared: &Arc<Shared>, mut frame: Frame, success: bool) {
    if success {
        Metrics::record_sent();
        trace!(peer = %frame.address(), ref_id = frame.ref_id(), "frame acknowledged");
        dispatch_sent(shared, &frame, true);
        return;
    }

    if frame.retries_exhausted() {
        Metrics::record_abandoned();
        debug!(
            peer = %frame.address(),
            ref_id = frame.ref_id(),
            retries = frame.retry_count(),
            "frame abandoned"
        );
        dispatch_sent(shared, &frame, false);
        return;
    }

    frame.increment_retry();
    Metrics::record_retry();
    debug!(
        peer = %frame.address(),
        ref_id = frame.ref_id(),
        retry = frame.retry_count(),
        "send failed, re-queueing"
    );
    // Retries join the tail: fairness across peers over latency for one.
    // The pop that put this frame in flight freed its slot, so the re-push
    // must not fail; if a concurrent send() claimed the slot the queue
    // briefly holds one extra frame instead of abandoning this one early.
    shared.outbound.force_push(frame);
}
