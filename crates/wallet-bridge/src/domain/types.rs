//! Request kinds and the typed views of agent payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The three request kinds the agent answers.
///
/// Each kind has its own pending queue and response timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Address and wallet metadata.
    WalletInfo,
    /// Message signature (needs user confirmation).
    SignMessage,
    /// Contract call submission (needs user confirmation).
    Transaction,
}

impl RequestKind {
    /// All kinds, in a stable order.
    pub const ALL: [RequestKind; 3] = [Self::WalletInfo, Self::SignMessage, Self::Transaction];

    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WalletInfo => "wallet_info",
            Self::SignMessage => "sign_message",
            Self::Transaction => "transaction",
        }
    }

    /// User-visible explanation when the agent never answers.
    pub fn not_responding_message(&self) -> &'static str {
        match self {
            Self::WalletInfo => "Xian Wallet Chrome extension not installed or not responding",
            Self::SignMessage | Self::Transaction => "Xian Wallet Chrome extension not responding",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wallet info as reported by the agent.
///
/// Only `address` is required; anything else the agent sends is kept in
/// `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletInfo {
    /// Account address (public key).
    pub address: String,
    /// Shortened address for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncated_address: Option<String>,
    /// Whether the wallet is locked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    /// Chain the wallet is connected to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    /// Unrecognised fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Signature returned by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureResponse {
    /// Hex-encoded signature.
    pub signature: String,
    /// Unrecognised fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A contract call to be signed and submitted by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Contract name.
    pub contract: String,
    /// Method on the contract.
    pub method: String,
    /// Keyword arguments.
    pub kwargs: Value,
    /// Optional stamp limit; the agent picks one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stamp_limit: Option<u64>,
}

impl TransactionRequest {
    /// Create a request without a stamp limit.
    pub fn new(contract: impl Into<String>, method: impl Into<String>, kwargs: Value) -> Self {
        Self {
            contract: contract.into(),
            method: method.into(),
            kwargs,
            stamp_limit: None,
        }
    }

    /// Set the stamp limit.
    #[must_use]
    pub fn with_stamp_limit(mut self, stamp_limit: u64) -> Self {
        self.stamp_limit = Some(stamp_limit);
        self
    }
}
