//! # Agent Events
//!
//! Every named event exchanged with the signing agent. The agent protocol is
//! fire-and-forget: a name plus an untyped JSON payload, with no built-in
//! correlation. Outbound events additionally carry a `request_id` that an
//! agent may echo back in its response detail.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire name of the info request.
pub const GET_INFO: &str = "xianWalletGetInfo";
/// Wire name of the sign-message request.
pub const SIGN_MESSAGE: &str = "xianWalletSignMsg";
/// Wire name of the transaction request.
pub const SEND_TRANSACTION: &str = "xianWalletSendTx";
/// Wire name of the info response.
pub const WALLET_INFO: &str = "xianWalletInfo";
/// Wire name of the sign-message response.
pub const SIGN_MESSAGE_RESPONSE: &str = "xianWalletSignMsgResponse";
/// Wire name of the transaction status response.
pub const TRANSACTION_STATUS: &str = "xianWalletTxStatus";
/// Wire name of the readiness announcement.
pub const READY: &str = "xianReady";

/// All events that can travel over the agent channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentEvent {
    // =========================================================================
    // OUTBOUND (bridge -> agent)
    // =========================================================================
    /// Ask the agent for the connected address and wallet metadata.
    GetInfo {
        /// Per-request identifier the agent may echo.
        request_id: String,
    },

    /// Ask the agent to sign an arbitrary message.
    /// Requires out-of-band user confirmation inside the agent.
    SignMessage {
        /// Per-request identifier the agent may echo.
        request_id: String,
        /// The message to sign.
        message: String,
    },

    /// Ask the agent to sign and submit a contract call.
    SendTransaction {
        /// Per-request identifier the agent may echo.
        request_id: String,
        /// Contract name (e.g. `currency`).
        contract: String,
        /// Method name on the contract.
        method: String,
        /// Keyword arguments for the call.
        kwargs: Value,
        /// Optional stamp (fee) limit.
        stamp_limit: Option<u64>,
    },

    // =========================================================================
    // INBOUND (agent -> bridge)
    // =========================================================================
    /// Address and metadata of the active wallet.
    WalletInfo(Value),

    /// Signature, or an `errors` detail.
    SignMessageResponse(Value),

    /// Either an `errors` detail or a `txid` to be polled on the ledger.
    TransactionStatus(Value),

    /// The agent finished loading and accepts requests.
    Ready,
}

impl AgentEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::GetInfo { .. } | Self::SignMessage { .. } | Self::SendTransaction { .. } => {
                EventTopic::Outbound
            }
            Self::WalletInfo(_)
            | Self::SignMessageResponse(_)
            | Self::TransactionStatus(_)
            | Self::Ready => EventTopic::Inbound,
        }
    }

    /// Stable wire name of the event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetInfo { .. } => GET_INFO,
            Self::SignMessage { .. } => SIGN_MESSAGE,
            Self::SendTransaction { .. } => SEND_TRANSACTION,
            Self::WalletInfo(_) => WALLET_INFO,
            Self::SignMessageResponse(_) => SIGN_MESSAGE_RESPONSE,
            Self::TransactionStatus(_) => TRANSACTION_STATUS,
            Self::Ready => READY,
        }
    }

    /// Request id of an outbound event.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::GetInfo { request_id }
            | Self::SignMessage { request_id, .. }
            | Self::SendTransaction { request_id, .. } => Some(request_id),
            _ => None,
        }
    }

    /// Payload of an inbound response event.
    #[must_use]
    pub fn detail(&self) -> Option<&Value> {
        match self {
            Self::WalletInfo(detail)
            | Self::SignMessageResponse(detail)
            | Self::TransactionStatus(detail) => Some(detail),
            _ => None,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Requests dispatched towards the agent.
    Outbound,
    /// Responses and announcements emitted by the agent.
    Inbound,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Wire names to include. Empty means all names.
    pub names: Vec<&'static str>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            names: Vec::new(),
        }
    }

    /// Create a filter for specific wire names.
    #[must_use]
    pub fn names(names: Vec<&'static str>) -> Self {
        Self {
            topics: Vec::new(),
            names,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &AgentEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let name_match = self.names.is_empty() || self.names.contains(&event.name());

        topic_match && name_match
    }
}
