//! Error types for the wallet bridge

use crate::domain::config::ConfigError;
use crate::domain::ledger::LedgerError;
use crate::domain::types::RequestKind;
use serde_json::Value;
use thiserror::Error;

/// Wallet bridge errors
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    /// The agent did not answer within the kind's timeout
    #[error("{}", .kind.not_responding_message())]
    AgentAbsent { kind: RequestKind, waited_ms: u64 },

    /// The agent answered with an `errors` detail
    #[error("wallet rejected {kind} request: {errors}")]
    AgentRejected { kind: RequestKind, errors: Value },

    /// The ledger never produced a record for a sent transaction
    #[error("transaction {tx_hash} not confirmed: {last_error}")]
    Unconfirmed {
        tx_hash: String,
        last_error: LedgerError,
    },

    /// A direct ledger query failed
    #[error("ledger query failed: {0}")]
    Ledger(#[from] LedgerError),

    /// A payload could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The bridge was shut down with the request still pending
    #[error("wallet bridge shut down")]
    Shutdown,
}

impl BridgeError {
    /// Whether the error came from the agent (as opposed to the ledger or
    /// local decoding).
    pub fn is_agent_error(&self) -> bool {
        matches!(self, Self::AgentAbsent { .. } | Self::AgentRejected { .. })
    }
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;
