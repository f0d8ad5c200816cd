//! Wallet Bridge Service - the request correlation and confirmation engine
//!
//! Presents request/response calls on top of the fire-and-forget agent
//! channel. One listener task consumes every inbound event and settles the
//! matching pending request; transaction statuses are handed to a resolver
//! task so the listener never waits on the ledger.

use crate::adapters::http_ledger::HttpLedgerClient;
use crate::domain::codec::agent_errors;
use crate::domain::config::BridgeConfig;
use crate::domain::correlation::CorrelationId;
use crate::domain::ledger::StateKey;
use crate::domain::outcome::TransactionOutcome;
use crate::domain::pending::{PendingEntry, PendingRequestQueue, StatsSnapshot};
use crate::domain::readiness::{Readiness, ReadinessGate};
use crate::domain::types::{RequestKind, SignatureResponse, TransactionRequest, WalletInfo};
use crate::error::{BridgeError, BridgeResult};
use crate::ports::inbound::WalletApi;
use crate::ports::outbound::LedgerQuery;
use crate::service::balance::read_balance;
use crate::service::resolver::ConfirmationResolver;
use agent_bus::{AgentEvent, EventFilter, EventPublisher, EventTopic, InMemoryEventBus};
use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Pending-queue counters per request kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BridgeStats {
    /// Whether the agent announced readiness
    pub ready: bool,
    /// Wallet info queue
    pub wallet_info: StatsSnapshot,
    /// Sign-message queue
    pub sign_message: StatsSnapshot,
    /// Transaction queue
    pub transaction: StatsSnapshot,
}

impl BridgeStats {
    /// Counters for one kind.
    pub fn for_kind(&self, kind: RequestKind) -> StatsSnapshot {
        match kind {
            RequestKind::WalletInfo => self.wallet_info,
            RequestKind::SignMessage => self.sign_message,
            RequestKind::Transaction => self.transaction,
        }
    }

    /// Counters summed over every kind.
    pub fn total(&self) -> StatsSnapshot {
        self.wallet_info
            .merge(self.sign_message)
            .merge(self.transaction)
    }
}

/// State shared between the bridge handle and its listener task.
struct BridgeInner {
    config: BridgeConfig,
    bus: Arc<InMemoryEventBus>,
    ledger: Arc<dyn LedgerQuery>,
    resolver: ConfirmationResolver,
    readiness: ReadinessGate,
    info_queue: Arc<PendingRequestQueue<WalletInfo>>,
    sign_queue: Arc<PendingRequestQueue<SignatureResponse>>,
    tx_queue: Arc<PendingRequestQueue<TransactionOutcome>>,
    resolvers: Mutex<JoinSet<()>>,
    shut_down: watch::Sender<bool>,
}

impl BridgeInner {
    fn handle_inbound(&self, event: AgentEvent) {
        match event {
            AgentEvent::Ready => {
                self.readiness.mark_ready();
            }
            AgentEvent::WalletInfo(detail) => settle_direct(&self.info_queue, detail),
            AgentEvent::SignMessageResponse(detail) => settle_direct(&self.sign_queue, detail),
            AgentEvent::TransactionStatus(detail) => self.handle_transaction_status(detail),
            other => {
                debug!(event = other.name(), "Ignoring non-inbound event");
            }
        }
    }

    fn handle_transaction_status(&self, detail: Value) {
        let Some(entry) = take_entry(&self.tx_queue, &detail) else {
            return;
        };

        let resolver = self.resolver.clone();
        let mut resolvers = self.resolvers.lock();
        // Reap finished resolvers so the set does not grow unbounded
        while resolvers.try_join_next().is_some() {}
        resolvers.spawn(async move {
            let outcome = resolver.resolve(&detail).await;
            entry.settle(outcome);
        });
    }

    fn is_shut_down(&self) -> bool {
        *self.shut_down.borrow()
    }

    fn stats(&self) -> BridgeStats {
        BridgeStats {
            ready: self.readiness.is_ready(),
            wallet_info: self.info_queue.snapshot(),
            sign_message: self.sign_queue.snapshot(),
            transaction: self.tx_queue.snapshot(),
        }
    }
}

/// Remove the pending entry a response belongs to, counting it as spurious
/// when there is none.
fn take_entry<T>(queue: &PendingRequestQueue<T>, detail: &Value) -> Option<PendingEntry<T>> {
    let echoed = CorrelationId::from_detail(detail);
    let entry = queue.take(echoed);

    if entry.is_none() {
        queue.record_spurious();
        warn!(
            kind = %queue.kind(),
            echoed = ?echoed,
            "Response with no matching pending request, dropped"
        );
    }
    entry
}

/// Settle a non-transaction request straight from the response detail.
fn settle_direct<T: DeserializeOwned>(queue: &PendingRequestQueue<T>, detail: Value) {
    let Some(entry) = take_entry(queue, &detail) else {
        return;
    };

    let kind = queue.kind();
    let result = match agent_errors(&detail) {
        Some(errors) => Err(BridgeError::AgentRejected {
            kind,
            errors: errors.clone(),
        }),
        None => serde_json::from_value(detail)
            .map_err(|e| BridgeError::Decode(format!("invalid {kind} response: {e}"))),
    };
    entry.settle(result);
}

/// The wallet bridge engine.
///
/// One instance per application session. Dropping it stops the listener
/// and any in-flight confirmation polling.
pub struct WalletBridge {
    inner: Arc<BridgeInner>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl WalletBridge {
    /// Create a bridge over an existing bus and ledger.
    pub fn new(
        config: BridgeConfig,
        bus: Arc<InMemoryEventBus>,
        ledger: Arc<dyn LedgerQuery>,
    ) -> BridgeResult<Self> {
        config.validate()?;

        let inner = BridgeInner {
            resolver: ConfirmationResolver::new(Arc::clone(&ledger), config.backoff),
            readiness: ReadinessGate::new(config.ready_timeout()),
            info_queue: Arc::new(PendingRequestQueue::new(RequestKind::WalletInfo)),
            sign_queue: Arc::new(PendingRequestQueue::new(RequestKind::SignMessage)),
            tx_queue: Arc::new(PendingRequestQueue::new(RequestKind::Transaction)),
            resolvers: Mutex::new(JoinSet::new()),
            shut_down: watch::Sender::new(false),
            config,
            bus,
            ledger,
        };

        Ok(Self {
            inner: Arc::new(inner),
            listener: Mutex::new(None),
        })
    }

    /// Create a bridge that queries the ledger over HTTP at `config.rpc_url`.
    pub fn connect(config: BridgeConfig, bus: Arc<InMemoryEventBus>) -> BridgeResult<Self> {
        config.validate()?;
        let ledger = HttpLedgerClient::from_config(&config)?;
        Self::new(config, bus, Arc::new(ledger))
    }

    /// Create a bridge on a fresh bus of `config.bus_capacity` with an HTTP
    /// ledger. The bus is returned so the agent side can be attached to it.
    pub fn open(config: BridgeConfig) -> BridgeResult<(Self, Arc<InMemoryEventBus>)> {
        config.validate()?;
        let bus = Arc::new(InMemoryEventBus::with_capacity(config.bus_capacity));
        let bridge = Self::connect(config, Arc::clone(&bus))?;
        Ok((bridge, bus))
    }

    /// Start listening for agent events.
    ///
    /// Requests start the listener on demand; calling this up front only
    /// makes sure an early ready announcement is not missed. A second call
    /// is a no-op.
    pub fn start(&self) {
        if self.inner.is_shut_down() {
            warn!("Wallet bridge was shut down, not starting");
            return;
        }
        if !self.spawn_listener() {
            warn!("Wallet bridge already started, ignoring");
        }
    }

    /// Whether the listener is running.
    pub fn is_running(&self) -> bool {
        self.listener
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn spawn_listener(&self) -> bool {
        let mut listener = self.listener.lock();
        if listener.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return false;
        }

        // Subscribe before spawning so nothing published after start() is lost
        let mut subscription = self
            .inner
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::Inbound]));
        let inner = Arc::clone(&self.inner);

        *listener = Some(tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                inner.handle_inbound(event);
            }
            debug!("Agent bus closed, listener exiting");
        }));

        info!(rpc_url = %self.inner.config.base_url(), "Wallet bridge started");
        true
    }

    fn ensure_listener(&self) -> BridgeResult<()> {
        if self.inner.is_shut_down() {
            return Err(BridgeError::Shutdown);
        }
        self.spawn_listener();
        Ok(())
    }

    /// Stop the listener and settle everything still pending with
    /// [`BridgeError::Shutdown`].
    pub fn shutdown(&self) {
        if self.inner.shut_down.send_replace(true) {
            return;
        }
        if let Some(listener) = self.listener.lock().take() {
            listener.abort();
        }
        // Aborted resolvers drop their entries, which their callers see as shutdown
        self.inner.resolvers.lock().abort_all();

        let drained =
            self.inner.info_queue.drain() + self.inner.sign_queue.drain() + self.inner.tx_queue.drain();
        info!(drained = drained, "Wallet bridge shut down");
    }

    /// Configuration in use.
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Pending-queue counters.
    pub fn stats(&self) -> BridgeStats {
        self.inner.stats()
    }

    /// Register, dispatch and await one agent request.
    async fn issue<T, F>(&self, queue: &Arc<PendingRequestQueue<T>>, build: F) -> BridgeResult<T>
    where
        T: Send + 'static,
        F: FnOnce(String) -> AgentEvent,
    {
        self.ensure_listener()?;
        let started = Instant::now();
        let mut shut_down = self.inner.shut_down.subscribe();
        let shutdown_signalled = async move {
            // The borrowed value is not Send; drop it before leaving
            let _ = shut_down.wait_for(|down| *down).await;
        };
        tokio::select! {
            _ = self.inner.readiness.wait_until_ready() => {}
            () = shutdown_signalled => return Err(BridgeError::Shutdown),
        }

        // A shutdown between the wait and here has closed the queue
        let kind = queue.kind();
        let (id, rx) = queue.register()?;
        let window = self.inner.config.response_window(kind, started.elapsed());
        queue.spawn_timer(id, window);

        let receivers = self.inner.bus.publish(build(id.to_string())).await;
        debug!(
            correlation_id = %id,
            kind = %kind,
            receivers = receivers,
            "Dispatched agent request"
        );

        // A dropped sender means the entry was discarded by shutdown
        rx.await.unwrap_or(Err(BridgeError::Shutdown))
    }
}

impl Drop for WalletBridge {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.get_mut().take() {
            listener.abort();
        }
        self.inner.resolvers.lock().abort_all();
    }
}

#[async_trait]
impl WalletApi for WalletBridge {
    async fn wait_until_ready(&self) -> Readiness {
        // Readiness is advisory; a shut-down bridge simply never becomes ready
        let _ = self.ensure_listener();
        self.inner.readiness.wait_until_ready().await
    }

    async fn request_wallet_info(&self) -> BridgeResult<WalletInfo> {
        self.issue(&self.inner.info_queue, |request_id| AgentEvent::GetInfo {
            request_id,
        })
        .await
    }

    async fn sign_message(&self, message: &str) -> BridgeResult<SignatureResponse> {
        let message = message.to_string();
        self.issue(&self.inner.sign_queue, |request_id| AgentEvent::SignMessage {
            request_id,
            message,
        })
        .await
    }

    async fn send_transaction(&self, request: TransactionRequest) -> BridgeResult<TransactionOutcome> {
        let TransactionRequest {
            contract,
            method,
            kwargs,
            stamp_limit,
        } = request;

        self.issue(&self.inner.tx_queue, |request_id| AgentEvent::SendTransaction {
            request_id,
            contract,
            method,
            kwargs,
            stamp_limit,
        })
        .await
    }

    async fn balance_of(&self, address: &str, contract: &str) -> BridgeResult<Decimal> {
        read_balance(self.inner.ledger.as_ref(), &StateKey::balance(contract, address)).await
    }

    async fn approved_balance_of(
        &self,
        contract: &str,
        owner: &str,
        spender: &str,
    ) -> BridgeResult<Decimal> {
        let key = StateKey::approval(contract, owner, spender);
        read_balance(self.inner.ledger.as_ref(), &key).await
    }
}
