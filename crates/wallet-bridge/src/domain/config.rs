//! Bridge configuration with validation.
//!
//! Every timeout has a default matching the agent's behaviour; the ledger
//! endpoint defaults to the public testnet and can be overridden at
//! initialization or through the environment.

use crate::domain::backoff::BackoffPolicy;
use crate::domain::types::RequestKind;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Public testnet ledger endpoint.
pub const DEFAULT_RPC_URL: &str = "https://testnet.xian.org";

/// Main bridge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Base URL of the ledger query service
    pub rpc_url: String,
    /// Bounded fallback for the readiness wait
    pub ready_timeout_ms: u64,
    /// Response timeout for wallet info requests
    pub info_timeout_ms: u64,
    /// Response timeout for sign-message requests (needs user confirmation)
    pub sign_timeout_ms: u64,
    /// Response timeout for transaction requests (needs user confirmation)
    pub tx_timeout_ms: u64,
    /// Minimum time the agent gets to answer once a request is dispatched
    pub response_grace_ms: u64,
    /// Confirmation polling policy
    pub backoff: BackoffPolicy,
    /// Per-attempt HTTP timeout against the ledger
    pub http_timeout_ms: u64,
    /// Event bus buffer size
    pub bus_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            ready_timeout_ms: 2_000,
            info_timeout_ms: 2_000,
            sign_timeout_ms: 30_000,
            tx_timeout_ms: 30_000,
            response_grace_ms: 200,
            backoff: BackoffPolicy::default(),
            http_timeout_ms: 10_000,
            bus_capacity: agent_bus::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl BridgeConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `XIAN_RPC_URL`: Ledger base URL (default: https://testnet.xian.org)
    /// - `XIAN_READY_TIMEOUT_MS`: Readiness fallback (default: 2000)
    /// - `XIAN_INFO_TIMEOUT_MS`: Wallet info timeout (default: 2000)
    /// - `XIAN_SIGN_TIMEOUT_MS`: Sign-message timeout (default: 30000)
    /// - `XIAN_TX_TIMEOUT_MS`: Transaction timeout (default: 30000)
    /// - `XIAN_BACKOFF_INITIAL_MS`: First polling delay (default: 1000)
    /// - `XIAN_BACKOFF_RETRIES`: Polling retries (default: 5)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, falling back to
    /// defaults for missing or unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let number = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        Self {
            rpc_url: lookup("XIAN_RPC_URL").unwrap_or(defaults.rpc_url),
            ready_timeout_ms: number("XIAN_READY_TIMEOUT_MS", defaults.ready_timeout_ms),
            info_timeout_ms: number("XIAN_INFO_TIMEOUT_MS", defaults.info_timeout_ms),
            sign_timeout_ms: number("XIAN_SIGN_TIMEOUT_MS", defaults.sign_timeout_ms),
            tx_timeout_ms: number("XIAN_TX_TIMEOUT_MS", defaults.tx_timeout_ms),
            response_grace_ms: defaults.response_grace_ms,
            backoff: BackoffPolicy {
                initial_delay_ms: number(
                    "XIAN_BACKOFF_INITIAL_MS",
                    defaults.backoff.initial_delay_ms,
                ),
                max_retries: lookup("XIAN_BACKOFF_RETRIES")
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(defaults.backoff.max_retries),
            },
            http_timeout_ms: defaults.http_timeout_ms,
            bus_capacity: defaults.bus_capacity,
        }
    }

    /// Override the ledger base URL.
    #[must_use]
    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.rpc_url.trim();
        if url.is_empty() {
            return Err(ConfigError::InvalidUrl("rpc_url cannot be empty".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(format!(
                "rpc_url must be http(s): {url}"
            )));
        }

        let timeouts = [
            ("ready_timeout_ms", self.ready_timeout_ms),
            ("info_timeout_ms", self.info_timeout_ms),
            ("sign_timeout_ms", self.sign_timeout_ms),
            ("tx_timeout_ms", self.tx_timeout_ms),
            ("http_timeout_ms", self.http_timeout_ms),
            ("backoff.initial_delay_ms", self.backoff.initial_delay_ms),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, ms)| *ms == 0) {
            return Err(ConfigError::InvalidTimeout(format!("{name} cannot be 0")));
        }

        if self.bus_capacity == 0 {
            return Err(ConfigError::Invalid("bus_capacity cannot be 0".into()));
        }

        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.rpc_url.trim().trim_end_matches('/')
    }

    /// Readiness fallback duration.
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    /// Response timeout for a request kind.
    pub fn timeout_for(&self, kind: RequestKind) -> Duration {
        let ms = match kind {
            RequestKind::WalletInfo => self.info_timeout_ms,
            RequestKind::SignMessage => self.sign_timeout_ms,
            RequestKind::Transaction => self.tx_timeout_ms,
        };
        Duration::from_millis(ms)
    }

    /// How long a request of `kind` waits for its response after having
    /// already spent `waited` on the readiness gate.
    ///
    /// The kind's timeout counts from the start of the call, but the agent
    /// always gets at least the grace window once the request is out.
    pub fn response_window(&self, kind: RequestKind, waited: Duration) -> Duration {
        self.timeout_for(kind)
            .saturating_sub(waited)
            .max(Duration::from_millis(self.response_grace_ms))
    }

    /// Per-attempt HTTP timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Ledger URL missing or not http(s)
    #[error("invalid rpc url: {0}")]
    InvalidUrl(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
