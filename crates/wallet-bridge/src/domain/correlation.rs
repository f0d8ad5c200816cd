//! Correlation ID attached to every outbound agent request.
//!
//! Uses UUID v7 for time-ordered, unique identifiers. The agent protocol has
//! no correlation field of its own; an agent that echoes `request_id` in its
//! response detail gets exact routing, everything else falls back to FIFO.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Detail keys an agent may use to echo the request id.
const ECHO_KEYS: [&str; 2] = ["request_id", "requestId"];

/// Correlation ID for one pending agent request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate a new correlation ID (UUID v7)
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse from string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }

    /// Read an echoed id from a response payload.
    ///
    /// Returns `None` when the agent did not echo one or it is not a UUID.
    pub fn from_detail(detail: &Value) -> Option<Self> {
        ECHO_KEYS
            .iter()
            .find_map(|key| detail.get(*key))
            .and_then(Value::as_str)
            .and_then(|s| Self::parse(s).ok())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CorrelationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
