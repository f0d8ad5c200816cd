//! Readiness gate for the signing agent.
//!
//! The agent announces itself once with a ready event. Callers that arrive
//! earlier queue up and are released together, in arrival order. A caller
//! never waits longer than the fallback: an agent that never announces
//! (not installed, or loaded before the bridge subscribed) must not hang
//! requests forever.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info};

/// How a wait on the gate ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The agent announced readiness.
    Ready,
    /// The fallback elapsed first; proceed anyway.
    FallbackElapsed,
}

struct GateState {
    ready: bool,
    waiters: VecDeque<(u64, oneshot::Sender<()>)>,
    next_id: u64,
}

/// One-way latch released by the agent's ready event.
pub struct ReadinessGate {
    state: Mutex<GateState>,
    fallback: Duration,
}

impl ReadinessGate {
    /// Create a closed gate with the given fallback.
    pub fn new(fallback: Duration) -> Self {
        Self {
            state: Mutex::new(GateState {
                ready: false,
                waiters: VecDeque::new(),
                next_id: 0,
            }),
            fallback,
        }
    }

    /// Whether the agent has announced readiness.
    pub fn is_ready(&self) -> bool {
        self.state.lock().ready
    }

    /// Number of callers currently waiting.
    pub fn waiting(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Open the gate and release every waiter in arrival order.
    ///
    /// Idempotent: a repeated ready event releases nothing. Returns the
    /// number of waiters released.
    pub fn mark_ready(&self) -> usize {
        let waiters = {
            let mut state = self.state.lock();
            if state.ready {
                debug!("Duplicate ready event ignored");
                return 0;
            }
            state.ready = true;
            std::mem::take(&mut state.waiters)
        };

        let released = waiters.len();
        for (_, waiter) in waiters {
            // A waiter whose fallback fired concurrently is already gone.
            let _ = waiter.send(());
        }

        info!(released = released, "Wallet agent ready");
        released
    }

    /// Wait until the agent is ready or the fallback elapses.
    pub async fn wait_until_ready(&self) -> Readiness {
        let (id, rx) = {
            let mut state = self.state.lock();
            if state.ready {
                return Readiness::Ready;
            }
            let id = state.next_id;
            state.next_id = state.next_id.wrapping_add(1);
            let (tx, rx) = oneshot::channel();
            // Waits dropped before their fallback leave closed senders behind
            state.waiters.retain(|(_, waiter)| !waiter.is_closed());
            state.waiters.push_back((id, tx));
            (id, rx)
        };

        if let Ok(Ok(())) = tokio::time::timeout(self.fallback, rx).await {
            return Readiness::Ready;
        }

        let mut state = self.state.lock();
        state.waiters.retain(|(waiter_id, _)| *waiter_id != id);
        if state.ready {
            Readiness::Ready
        } else {
            debug!(
                fallback_ms = self.fallback.as_millis(),
                "No ready event, proceeding after fallback"
            );
            Readiness::FallbackElapsed
        }
    }
}
