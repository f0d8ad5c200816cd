//! Domain layer: request bookkeeping, ledger records and decoding.

pub mod backoff;
pub mod codec;
pub mod config;
pub mod correlation;
pub mod ledger;
pub mod outcome;
pub mod pending;
pub mod readiness;
pub mod types;

pub use backoff::{poll_until_found, BackoffAttempt, BackoffPolicy};
pub use codec::{
    agent_errors, decode_state_value, decode_tx_record, parse_balance, EMPTY_STATE_SENTINEL,
};
pub use config::{BridgeConfig, ConfigError, DEFAULT_RPC_URL};
pub use correlation::CorrelationId;
pub use ledger::{LedgerError, StateKey, StateRecord, TxExecution, TxRecord};
pub use outcome::{ConfirmedTransaction, TransactionOutcome};
pub use pending::{PendingEntry, PendingRequestQueue, PendingStats, StatsSnapshot};
pub use readiness::{Readiness, ReadinessGate};
pub use types::{RequestKind, SignatureResponse, TransactionRequest, WalletInfo};
