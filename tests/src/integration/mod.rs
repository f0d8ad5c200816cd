//! # Integration Test Flows
//!
//! Every flow goes through the public `WalletApi`. Agent behaviour comes
//! from `SimulatedAgent` responders; time is paused so backoff and timeout
//! durations are asserted exactly.

pub mod correlation;
pub mod ledger_http;
pub mod readiness;

use std::sync::Arc;

use agent_bus::InMemoryEventBus;
use wallet_bridge::testing::ScriptedLedger;
use wallet_bridge::{BridgeConfig, WalletBridge};

/// Address used by every simulated wallet.
pub const WALLET_ADDRESS: &str =
    "e787ed5907742fa8d50b3ca2701ab8e03ec749ced806a15cdab800a127d7f863";

/// A started bridge over a fresh bus and the given ledger.
pub fn started_bridge(ledger: Arc<ScriptedLedger>) -> (WalletBridge, Arc<InMemoryEventBus>) {
    let bus = Arc::new(InMemoryEventBus::new());
    let bridge = WalletBridge::new(BridgeConfig::default(), Arc::clone(&bus), ledger)
        .unwrap_or_else(|e| panic!("default config must be valid: {e}"));
    bridge.start();
    (bridge, bus)
}
