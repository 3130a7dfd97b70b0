//! Correlation bridge.
//!
//! Flow:
//! 1. The HTTP adapter calls `begin_request()` with the extracted request
//! 2. The bridge mints a `RequestId`, registers a slot and emits the event
//! 3. The adapter awaits `await_response()` on its own task
//! 4. The external handler calls `resolve()` from whatever task it runs on
//! 5. The waiter wakes with the body, or gives up at the deadline

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::bridge::events::{InboundRequest, RequestDescriptor};
use crate::bridge::pending::{PendingTable, RequestId, SlotResolution};
use crate::error::BridgeError;
use crate::observability::metrics;

/// Fresh ids minted before giving up on a colliding generator.
const MAX_ID_ATTEMPTS: usize = 3;

/// How a bridged request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// The external handler answered with this body.
    Delivered(String),
    /// No answer before the deadline, or the listener stopped.
    TimedOut,
}

impl ResponseOutcome {
    pub fn into_result(self, id: RequestId) -> Result<String, BridgeError> {
        match self {
            ResponseOutcome::Delivered(body) => Ok(body),
            ResponseOutcome::TimedOut => Err(BridgeError::Timeout(id)),
        }
    }
}

/// Counters for the lifetime of one bridge.
#[derive(Debug, Default)]
pub struct BridgeStats {
    pub total_registered: AtomicU64,
    pub total_delivered: AtomicU64,
    pub total_timeouts: AtomicU64,
    /// Waiters woken by `close()`.
    pub total_cancelled: AtomicU64,
    /// Responses for ids that were not pending.
    pub total_unknown: AtomicU64,
}

/// A registered request whose response has not been collected yet.
///
/// Dropping it removes the slot, so a request whose serving future is
/// abandoned (client hung up) does not leave an entry behind.
#[derive(Debug)]
pub struct PendingResponse {
    id: RequestId,
    receiver: oneshot::Receiver<SlotResolution>,
    table: Arc<PendingTable>,
}

impl PendingResponse {
    pub fn id(&self) -> RequestId {
        self.id
    }
}

impl Drop for PendingResponse {
    fn drop(&mut self) {
        self.table.remove(&self.id);
    }
}

/// Matches asynchronously produced responses to the requests waiting on them.
pub struct CorrelationBridge {
    pending: Arc<PendingTable>,
    events: mpsc::UnboundedSender<RequestDescriptor>,
    default_timeout: Duration,
    closed: AtomicBool,
    stats: BridgeStats,
}

impl CorrelationBridge {
    pub fn new(events: mpsc::UnboundedSender<RequestDescriptor>, default_timeout: Duration) -> Self {
        Self {
            pending: Arc::new(PendingTable::new()),
            events,
            default_timeout,
            closed: AtomicBool::new(false),
            stats: BridgeStats::default(),
        }
    }

    /// Register a request and notify the external handler.
    pub fn begin_request(&self, request: InboundRequest) -> Result<PendingResponse, BridgeError> {
        if self.is_closed() {
            return Err(BridgeError::Closed);
        }

        let (id, receiver) = self.register_unique()?;
        let pending = PendingResponse {
            id,
            receiver,
            table: Arc::clone(&self.pending),
        };

        // close() may have drained the table between the check above and the insert.
        if self.is_closed() {
            return Err(BridgeError::Closed);
        }

        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);
        metrics::record_bridge_event("registered");
        metrics::record_pending(self.pending.len());

        let descriptor = RequestDescriptor::new(id, request);
        debug!(
            request_id = %id,
            method = %descriptor.method,
            path = %descriptor.path,
            "Registered pending request"
        );

        if self.events.send(descriptor).is_err() {
            warn!(request_id = %id, "Request event channel closed, no handler to notify");
            metrics::record_bridge_event("handler_missing");
            return Err(BridgeError::HandlerMissing);
        }

        Ok(pending)
    }

    /// Wait for the response to `pending`, at most `timeout`.
    pub async fn await_response(
        &self,
        mut pending: PendingResponse,
        timeout: Duration,
    ) -> ResponseOutcome {
        let id = pending.id;

        let outcome = match tokio::time::timeout(timeout, &mut pending.receiver).await {
            Ok(Ok(SlotResolution::Delivered(body))) => ResponseOutcome::Delivered(body),
            Ok(Ok(SlotResolution::Cancelled)) | Ok(Err(_)) => {
                debug!(request_id = %id, "Pending request cancelled");
                ResponseOutcome::TimedOut
            }
            Err(_) => {
                // A missing entry means a resolver took the slot right at the deadline
                // and is about to send on it; its answer wins.
                if !self.pending.remove(&id) {
                    if let Ok(SlotResolution::Delivered(body)) = (&mut pending.receiver).await {
                        return ResponseOutcome::Delivered(body);
                    }
                }
                self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
                metrics::record_bridge_event("timeout");
                warn!(
                    request_id = %id,
                    timeout_ms = timeout.as_millis() as u64,
                    "Timed out waiting for response"
                );
                ResponseOutcome::TimedOut
            }
        };

        drop(pending);
        metrics::record_pending(self.pending.len());
        outcome
    }

    /// Deliver `body` to the request waiting under `request_id`.
    ///
    /// Returns `UnknownCorrelation` when nothing is waiting under that id;
    /// the table is left untouched in that case.
    pub fn resolve(&self, request_id: &str, body: impl Into<String>) -> Result<(), BridgeError> {
        let id: RequestId = match request_id.parse() {
            Ok(id) => id,
            Err(_) => return Err(self.unknown(request_id)),
        };

        match self.pending.resolve(&id, body.into()) {
            Some(waited) => {
                self.stats.total_delivered.fetch_add(1, Ordering::Relaxed);
                metrics::record_bridge_event("delivered");
                debug!(
                    request_id = %id,
                    response_time_ms = waited.as_millis() as u64,
                    "Response received"
                );
                Ok(())
            }
            None => Err(self.unknown(request_id)),
        }
    }

    fn unknown(&self, request_id: &str) -> BridgeError {
        self.stats.total_unknown.fetch_add(1, Ordering::Relaxed);
        metrics::record_bridge_event("unknown");
        warn!(request_id = %request_id, "Response for unknown or expired request id");
        BridgeError::UnknownCorrelation(request_id.to_string())
    }

    /// Refuse new requests and force every waiter to time out.
    ///
    /// Returns how many requests were pending. Safe to call repeatedly.
    pub fn close(&self) -> usize {
        self.closed.store(true, Ordering::SeqCst);
        let cancelled = self.pending.cancel_all();
        if cancelled > 0 {
            self.stats
                .total_cancelled
                .fetch_add(cancelled as u64, Ordering::Relaxed);
            info!(cancelled, "Cancelled pending requests");
        }
        metrics::record_pending(0);
        cancelled
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, id: &RequestId) -> bool {
        self.pending.contains(id)
    }

    pub fn stats(&self) -> &BridgeStats {
        &self.stats
    }

    fn register_unique(&self) -> Result<(RequestId, oneshot::Receiver<SlotResolution>), BridgeError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = RequestId::new();
            if let Some(receiver) = self.pending.register(id) {
                return Ok((id, receiver));
            }
            warn!(request_id = %id, "Request id collision, minting another");
        }
        Err(BridgeError::IdCollision)
    }
}
