//! Pending request queues - async-to-event bridge for agent requests.
//!
//! The agent protocol carries no correlation id of its own, so each request
//! kind keeps a FIFO queue of outstanding callers. A response settles the
//! entry whose id it echoes, or the oldest entry whose caller is still
//! waiting when it echoes none.
//!
//! Flow:
//! 1. Caller calls `register()` and gets a oneshot receiver
//! 2. Caller arms a timer with `spawn_timer()` and publishes the request
//! 3. Listener calls `take()` on a response and settles the entry
//! 4. If the timer fires first, `expire()` settles it as agent-absent
//!
//! An entry owns its oneshot sender and `settle` consumes it, so every
//! registered request is settled at most once no matter how responses and
//! timers race.

use crate::domain::correlation::CorrelationId;
use crate::domain::types::RequestKind;
use crate::error::{BridgeError, BridgeResult};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Statistics for a pending queue
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Total requests registered
    pub total_registered: AtomicU64,
    /// Total requests settled by a response
    pub total_settled: AtomicU64,
    /// Total requests settled by their timer
    pub total_timeouts: AtomicU64,
    /// Total requests whose caller went away, or that were discarded on
    /// shutdown, before settlement
    pub total_cancelled: AtomicU64,
    /// Responses that matched no pending request
    pub total_spurious: AtomicU64,
}

/// Point-in-time copy of [`PendingStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Requests registered
    pub registered: u64,
    /// Settled by a response
    pub settled: u64,
    /// Settled by timeout
    pub timed_out: u64,
    /// Caller dropped, or discarded on shutdown
    pub cancelled: u64,
    /// Unmatched responses
    pub spurious: u64,
    /// Currently outstanding
    pub pending: usize,
}

impl StatsSnapshot {
    /// Sum two snapshots.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            registered: self.registered + other.registered,
            settled: self.settled + other.settled,
            timed_out: self.timed_out + other.timed_out,
            cancelled: self.cancelled + other.cancelled,
            spurious: self.spurious + other.spurious,
            pending: self.pending + other.pending,
        }
    }
}

/// One outstanding request, removed from its queue before settlement.
pub struct PendingEntry<T> {
    id: CorrelationId,
    kind: RequestKind,
    sender: oneshot::Sender<BridgeResult<T>>,
    created_at: Instant,
    timer: Option<AbortHandle>,
    stats: Arc<PendingStats>,
}

impl<T> PendingEntry<T> {
    /// Correlation id of the request.
    pub fn id(&self) -> CorrelationId {
        self.id
    }

    /// Kind of the request.
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Time since registration.
    pub fn elapsed(&self) -> Duration {
        self.created_at.elapsed()
    }

    fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Discard without a response, counting it as cancelled. `notice` is
    /// passed on if the caller is still listening.
    fn discard(mut self, notice: Option<BridgeResult<T>>) {
        self.disarm();
        if let Some(notice) = notice {
            let _ = self.sender.send(notice);
        }
        self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Deliver the result to the caller.
    ///
    /// Returns false if the caller already went away.
    pub fn settle(mut self, result: BridgeResult<T>) -> bool {
        self.disarm();
        let ok = result.is_ok();

        match self.sender.send(result) {
            Ok(()) => {
                self.stats.total_settled.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %self.id,
                    kind = %self.kind,
                    ok = ok,
                    response_time_ms = self.created_at.elapsed().as_millis(),
                    "Settled pending request"
                );
                true
            }
            Err(_) => {
                // Receiver was dropped (caller cancelled)
                self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %self.id,
                    kind = %self.kind,
                    "Pending request receiver dropped"
                );
                false
            }
        }
    }
}

struct QueueState<T> {
    entries: VecDeque<PendingEntry<T>>,
    closed: bool,
}

/// FIFO queue of outstanding requests of one kind.
pub struct PendingRequestQueue<T> {
    kind: RequestKind,
    state: Mutex<QueueState<T>>,
    stats: Arc<PendingStats>,
}

impl<T> PendingRequestQueue<T> {
    /// Create an empty queue.
    pub fn new(kind: RequestKind) -> Self {
        Self {
            kind,
            state: Mutex::new(QueueState {
                entries: VecDeque::new(),
                closed: false,
            }),
            stats: Arc::new(PendingStats::default()),
        }
    }

    /// Kind served by this queue.
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Append a request and get a receiver for its result.
    ///
    /// A second request while one is outstanding is allowed, but an agent
    /// that does not echo ids will be matched in FIFO order, which is only
    /// correct if it also answers in order.
    ///
    /// Fails with [`BridgeError::Shutdown`] once the queue was drained.
    pub fn register(&self) -> BridgeResult<(CorrelationId, oneshot::Receiver<BridgeResult<T>>)> {
        let id = CorrelationId::new();
        let (tx, rx) = oneshot::channel();

        let outstanding = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(BridgeError::Shutdown);
            }
            let entries = &mut state.entries;
            entries.push_back(PendingEntry {
                id,
                kind: self.kind,
                sender: tx,
                created_at: Instant::now(),
                timer: None,
                stats: Arc::clone(&self.stats),
            });
            entries.len() - 1
        };
        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);

        if outstanding > 0 {
            warn!(
                correlation_id = %id,
                kind = %self.kind,
                outstanding = outstanding,
                "Concurrent request of the same kind; responses without an echoed id are matched FIFO"
            );
        } else {
            debug!(correlation_id = %id, kind = %self.kind, "Registered pending request");
        }

        Ok((id, rx))
    }

    /// Attach the timer task of an entry so a response can cancel it.
    ///
    /// If the entry is already gone the timer is aborted immediately.
    pub fn arm_timer(&self, id: CorrelationId, timer: AbortHandle) {
        let mut state = self.state.lock();
        match state.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => entry.timer = Some(timer),
            None => timer.abort(),
        }
    }

    /// Remove the entry a response belongs to.
    ///
    /// With an echoed id only that entry qualifies; otherwise the oldest
    /// one whose caller is still waiting does. Entries passed over because
    /// their caller gave up are discarded as cancelled. The entry's timer is
    /// disarmed on removal, so a caller that needs more time to settle
    /// (ledger polling) is not cut short.
    pub fn take(&self, echoed: Option<CorrelationId>) -> Option<PendingEntry<T>> {
        let mut abandoned = Vec::new();
        let taken = {
            let mut state = self.state.lock();
            let entries = &mut state.entries;
            match echoed {
                Some(id) => entries
                    .iter()
                    .position(|entry| entry.id == id)
                    .and_then(|index| entries.remove(index)),
                None => loop {
                    match entries.pop_front() {
                        Some(entry) if entry.sender.is_closed() => abandoned.push(entry),
                        head => break head,
                    }
                },
            }
        };

        for entry in abandoned {
            debug!(
                correlation_id = %entry.id,
                kind = %self.kind,
                "Skipping pending request abandoned by its caller"
            );
            entry.discard(None);
        }

        taken.map(|mut entry| {
            entry.disarm();
            entry
        })
    }

    /// Settle an entry as agent-absent. No-op if it was already taken.
    pub fn expire(&self, id: CorrelationId) -> bool {
        let expired = {
            let mut state = self.state.lock();
            let entries = &mut state.entries;
            entries
                .iter()
                .position(|entry| entry.id == id)
                .and_then(|index| entries.remove(index))
        };

        let Some(mut entry) = expired else {
            return false;
        };
        // Called from the timer task itself; nothing left to abort.
        entry.timer = None;

        let waited = entry.elapsed();
        warn!(
            correlation_id = %id,
            kind = %self.kind,
            waited_ms = waited.as_millis(),
            "Agent did not respond in time"
        );
        self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);

        let waited_ms = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX);
        let kind = self.kind;
        let delivered = entry.sender.send(Err(BridgeError::AgentAbsent { kind, waited_ms }));
        if delivered.is_err() {
            self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
        }
        true
    }

    /// Close the queue and fail every outstanding entry with
    /// [`BridgeError::Shutdown`]. Later registrations fail the same way.
    ///
    /// Drained entries count as cancelled. Returns how many were drained.
    pub fn drain(&self) -> usize {
        let drained: Vec<_> = {
            let mut state = self.state.lock();
            state.closed = true;
            state.entries.drain(..).collect()
        };
        let count = drained.len();
        for entry in drained {
            entry.discard(Some(Err(BridgeError::Shutdown)));
        }
        count
    }

    /// Count a response that matched nothing.
    pub fn record_spurious(&self) {
        self.stats.total_spurious.fetch_add(1, Ordering::Relaxed);
    }

    /// Get number of currently pending requests
    pub fn pending_count(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Check if a correlation ID is pending
    pub fn is_pending(&self, id: &CorrelationId) -> bool {
        self.state.lock().entries.iter().any(|entry| entry.id == *id)
    }

    /// Get statistics
    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }

    /// Copy the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            registered: self.stats.total_registered.load(Ordering::Relaxed),
            settled: self.stats.total_settled.load(Ordering::Relaxed),
            timed_out: self.stats.total_timeouts.load(Ordering::Relaxed),
            cancelled: self.stats.total_cancelled.load(Ordering::Relaxed),
            spurious: self.stats.total_spurious.load(Ordering::Relaxed),
            pending: self.pending_count(),
        }
    }
}

impl<T: Send + 'static> PendingRequestQueue<T> {
    /// Spawn the timeout task for `id` and attach it to the entry.
    pub fn spawn_timer(self: &Arc<Self>, id: CorrelationId, timeout: Duration) {
        let queue = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            queue.expire(id);
        });
        self.arm_timer(id, handle.abort_handle());
    }
}
