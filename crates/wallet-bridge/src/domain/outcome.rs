//! Final outcome of a submitted transaction.

use crate::domain::ledger::LedgerError;
use crate::domain::types::RequestKind;
use crate::error::{BridgeError, BridgeResult};
use serde::Serialize;
use serde_json::Value;

/// A transaction the ledger has finalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmedTransaction {
    /// Transaction hash.
    pub hash: String,
    /// Block height, when the ledger reported one.
    pub height: Option<u64>,
    /// Execution result code; zero on success.
    pub code: u32,
    /// Decoded result payload with `original_tx` attached when it is an object.
    pub result: Value,
    /// Decoded original submission.
    pub original_tx: Value,
}

impl ConfirmedTransaction {
    /// Whether execution succeeded on-chain.
    pub fn succeeded(&self) -> bool {
        self.code == 0
    }
}

/// What the caller of `send_transaction` learns, produced exactly once.
///
/// `AgentRejected` and `Unconfirmed` are distinct: a rejected transaction
/// never reached the ledger, an unconfirmed one may still finalize later.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionOutcome {
    /// The ledger finalized the transaction.
    Confirmed(ConfirmedTransaction),
    /// The agent reported an error; nothing was polled.
    AgentRejected {
        /// Error detail, verbatim.
        errors: Value,
    },
    /// The retry budget ran out before the ledger produced a record.
    Unconfirmed {
        /// Hash the agent reported.
        tx_hash: String,
        /// Last lookup failure.
        last_error: LedgerError,
    },
}

impl TransactionOutcome {
    /// Whether the ledger finalized the transaction.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }

    /// Collapse into a `Result`, mapping the two failure outcomes onto their
    /// error variants.
    pub fn into_result(self) -> BridgeResult<ConfirmedTransaction> {
        match self {
            Self::Confirmed(tx) => Ok(tx),
            Self::AgentRejected { errors } => Err(BridgeError::AgentRejected {
                kind: RequestKind::Transaction,
                errors,
            }),
            Self::Unconfirmed {
                tx_hash,
                last_error,
            } => Err(BridgeError::Unconfirmed {
                tx_hash,
                last_error,
            }),
        }
    }
}
