//! # wallet-bridge
//!
//! Request/response bridge to an out-of-process signing agent.
//!
//! ## Overview
//!
//! The agent (a browser wallet extension) is only reachable through named,
//! fire-and-forget events. This crate provides:
//! - **Readiness Gate**: waits for the agent's ready announcement, with a
//!   bounded fallback
//! - **Request Correlation**: per-kind FIFO queues of pending callers, with
//!   exact routing when the agent echoes a request id
//! - **Timeouts**: every request settles exactly once, even with no agent
//! - **Confirmation**: exponential-backoff polling of the ledger until a
//!   sent transaction is finalized
//!
//! ## Architecture
//!
//! ```text
//! caller ──request_wallet_info()──→ WalletBridge ──GetInfo──→ agent-bus ──→ agent
//!                                       ↑                         │
//!                                       └──── listener task ◄─────┘ WalletInfo / TxStatus
//!                                                  │
//!                                                  └── ConfirmationResolver ──GET /tx──→ ledger
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use agent_bus::InMemoryEventBus;
//! use wallet_bridge::{BridgeConfig, TransactionRequest, WalletApi, WalletBridge};
//!
//! let bus = Arc::new(InMemoryEventBus::new());
//! let bridge = WalletBridge::connect(BridgeConfig::from_env(), bus)?;
//! bridge.start();
//!
//! let info = bridge.request_wallet_info().await?;
//! let outcome = bridge
//!     .send_transaction(TransactionRequest::new("currency", "transfer", kwargs))
//!     .await?;
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use adapters::HttpLedgerClient;
pub use domain::{
    BackoffPolicy, BridgeConfig, ConfigError, ConfirmedTransaction, CorrelationId, LedgerError,
    Readiness, RequestKind, SignatureResponse, StateKey, StatsSnapshot, TransactionOutcome,
    TransactionRequest, WalletInfo, DEFAULT_RPC_URL,
};
pub use error::{BridgeError, BridgeResult};
pub use ports::{LedgerQuery, WalletApi, NATIVE_CURRENCY};
pub use service::{read_balance, BridgeStats, ConfirmationResolver, WalletBridge};
