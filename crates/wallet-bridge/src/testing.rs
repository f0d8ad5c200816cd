//! Test doubles for the agent and the ledger.
//!
//! Only compiled for tests or with the `test-utils` feature.

use crate::domain::ledger::{
    AbciResponse, LedgerError, StateKey, StateRecord, TxExecution, TxRecord,
};
use crate::ports::outbound::LedgerQuery;
use agent_bus::{AgentEvent, EventFilter, EventPublisher, EventTopic, InMemoryEventBus};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Encode an original submission the way the ledger stores it:
/// base64 of the hex of the JSON text.
pub fn encode_original(original: &Value) -> String {
    STANDARD.encode(hex::encode(original.to_string()))
}

/// Build a successful ledger record.
pub fn tx_record(hash: &str, data_b64: &str, tx_b64: &str) -> TxRecord {
    TxRecord {
        hash: Some(hash.to_string()),
        height: Some("1".to_string()),
        tx_result: TxExecution {
            code: 0,
            data: Some(data_b64.to_string()),
            log: None,
        },
        tx: tx_b64.to_string(),
    }
}

struct ScriptedTx {
    failures_left: u32,
    record: TxRecord,
}

/// In-memory ledger that answers "not found" a scripted number of times
/// before returning a record. Unknown hashes and keys are never found.
#[derive(Default)]
pub struct ScriptedLedger {
    transactions: Mutex<HashMap<String, ScriptedTx>>,
    states: Mutex<HashMap<String, String>>,
    tx_calls: AtomicU32,
    state_calls: AtomicU32,
}

impl ScriptedLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `tx_hash` fail `failures` times, then return `record`.
    pub fn script_transaction(&self, tx_hash: &str, failures: u32, record: TxRecord) {
        self.transactions.lock().insert(
            tx_hash.to_string(),
            ScriptedTx {
                failures_left: failures,
                record,
            },
        );
    }

    /// Store a raw base64 state value under `key`.
    pub fn script_state(&self, key: &StateKey, value: &str) {
        self.states
            .lock()
            .insert(key.as_str().to_string(), value.to_string());
    }

    /// Transaction lookups made so far.
    pub fn tx_calls(&self) -> u32 {
        self.tx_calls.load(Ordering::SeqCst)
    }

    /// State lookups made so far.
    pub fn state_calls(&self) -> u32 {
        self.state_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerQuery for ScriptedLedger {
    async fn get_transaction(&self, tx_hash: &str) -> Result<TxRecord, LedgerError> {
        self.tx_calls.fetch_add(1, Ordering::SeqCst);

        let mut transactions = self.transactions.lock();
        match transactions.get_mut(tx_hash) {
            Some(scripted) if scripted.failures_left == 0 => Ok(scripted.record.clone()),
            Some(scripted) => {
                scripted.failures_left -= 1;
                Err(LedgerError::NotFound(format!("tx ({tx_hash}) not found")))
            }
            None => Err(LedgerError::NotFound(format!("tx ({tx_hash}) not found"))),
        }
    }

    async fn query_state(&self, key: &StateKey) -> Result<StateRecord, LedgerError> {
        self.state_calls.fetch_add(1, Ordering::SeqCst);

        let value = self
            .states
            .lock()
            .get(key.as_str())
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("no state at {key}")))?;

        Ok(StateRecord {
            response: AbciResponse {
                code: 0,
                value: Some(value),
                log: None,
            },
        })
    }
}

/// A fake signing agent listening on the bus.
///
/// Every outbound request is handed to the responder; the events it returns
/// are published back after the configured delay. The agent stops when
/// dropped.
pub struct SimulatedAgent {
    handle: JoinHandle<()>,
}

impl SimulatedAgent {
    /// Start an agent that answers immediately.
    pub fn spawn<F>(bus: Arc<InMemoryEventBus>, responder: F) -> Self
    where
        F: FnMut(&AgentEvent) -> Vec<AgentEvent> + Send + 'static,
    {
        Self::spawn_with_delay(bus, Duration::ZERO, responder)
    }

    /// Start an agent that answers after `delay`.
    pub fn spawn_with_delay<F>(bus: Arc<InMemoryEventBus>, delay: Duration, mut responder: F) -> Self
    where
        F: FnMut(&AgentEvent) -> Vec<AgentEvent> + Send + 'static,
    {
        let mut requests = bus.subscribe(EventFilter::topics(vec![EventTopic::Outbound]));

        let handle = tokio::spawn(async move {
            while let Some(request) = requests.recv().await {
                let replies = responder(&request);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                for reply in replies {
                    bus.publish(reply).await;
                }
            }
        });

        Self { handle }
    }

    /// Publish the agent's ready announcement.
    pub async fn announce_ready(bus: &InMemoryEventBus) {
        bus.publish(AgentEvent::Ready).await;
    }
}

impl Drop for SimulatedAgent {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
