//! Ledger query records and errors.
//!
//! The ledger speaks CometBFT JSON-RPC over HTTP GET. Transaction lookups
//! return the execution result and the original submission, both base64.
//! State lookups return a single base64 value.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure of a single ledger query attempt.
///
/// Every variant is retried identically by the backoff poller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The ledger has no record (yet).
    #[error("record not found: {0}")]
    NotFound(String),
    /// Non-2xx response.
    #[error("ledger returned HTTP {status}")]
    Http {
        /// Status code.
        status: u16,
    },
    /// Connection, TLS, or timeout failure.
    #[error("ledger transport failure: {0}")]
    Transport(String),
    /// The body could not be understood.
    #[error("malformed ledger response: {0}")]
    Parse(String),
}

/// JSON-RPC error member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcErrorBody {
    /// Error code.
    #[serde(default)]
    pub code: i64,
    /// Short message.
    #[serde(default)]
    pub message: String,
    /// Detail, e.g. `tx (ABC) not found`.
    #[serde(default)]
    pub data: Option<String>,
}

impl fmt::Display for RpcErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            Some(data) => write!(f, "{} ({}): {}", self.message, self.code, data),
            None => write!(f, "{} ({})", self.message, self.code),
        }
    }
}

/// JSON-RPC envelope around every ledger response.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcEnvelope<T> {
    /// Present on success.
    pub result: Option<T>,
    /// Present on failure.
    pub error: Option<RpcErrorBody>,
}

impl<T> RpcEnvelope<T> {
    /// Unwrap the envelope. An `error` member means the record is not there.
    pub fn into_result(self) -> Result<T, LedgerError> {
        if let Some(error) = self.error {
            return Err(LedgerError::NotFound(error.to_string()));
        }
        self.result
            .ok_or_else(|| LedgerError::Parse("missing result".to_string()))
    }
}

/// Indexed transaction as returned by `/tx`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    /// Transaction hash (upper-case hex).
    #[serde(default)]
    pub hash: Option<String>,
    /// Block height, as a decimal string.
    #[serde(default)]
    pub height: Option<String>,
    /// Execution result.
    pub tx_result: TxExecution,
    /// Base64 of the original submission (itself hex-encoded JSON).
    pub tx: String,
}

/// Execution result of an indexed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxExecution {
    /// Result code, zero on success.
    #[serde(default)]
    pub code: u32,
    /// Base64 of the JSON result payload.
    #[serde(default)]
    pub data: Option<String>,
    /// Execution log.
    #[serde(default)]
    pub log: Option<String>,
}

/// Result of `/abci_query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    /// Query response.
    pub response: AbciResponse,
}

/// Inner ABCI query response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbciResponse {
    /// Response code.
    #[serde(default)]
    pub code: u32,
    /// Base64 value, `AA==` when the key holds nothing.
    #[serde(default)]
    pub value: Option<String>,
    /// Query log.
    #[serde(default)]
    pub log: Option<String>,
}

/// Path into contract state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey(String);

impl StateKey {
    /// `{contract}.balances:{address}`
    pub fn balance(contract: &str, address: &str) -> Self {
        Self(format!("{contract}.balances:{address}"))
    }

    /// `{contract}.balances:{owner}:{spender}`, the amount `owner` approved
    /// `spender` to move.
    pub fn approval(contract: &str, owner: &str, spender: &str) -> Self {
        Self(format!("{contract}.balances:{owner}:{spender}"))
    }

    /// Raw key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// ABCI query path.
    pub fn query_path(&self) -> String {
        format!("/get/{}", self.0)
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
