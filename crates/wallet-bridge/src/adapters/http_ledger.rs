//! Ledger query adapter over the node's JSON-RPC HTTP interface.

use crate::domain::config::BridgeConfig;
use crate::domain::ledger::{LedgerError, RpcEnvelope, StateKey, StateRecord, TxRecord};
use crate::ports::outbound::LedgerQuery;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// [`LedgerQuery`] backed by HTTP GET requests.
pub struct HttpLedgerClient {
    client: Client,
    base_url: String,
}

impl HttpLedgerClient {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    /// Create a client from bridge configuration.
    pub fn from_config(config: &BridgeConfig) -> Result<Self, LedgerError> {
        Self::new(config.base_url(), config.http_timeout())
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn tx_url(&self, tx_hash: &str) -> String {
        let hash = tx_hash.trim();
        let hash = hash.strip_prefix("0x").unwrap_or(hash);
        format!("{}/tx?hash=0x{}", self.base_url, hash)
    }

    fn state_url(&self, key: &StateKey) -> String {
        format!("{}/abci_query?path=%22{}%22", self.base_url, key.query_path())
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, LedgerError> {
        debug!(url = url, "Ledger query");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_connect() {
                LedgerError::Transport(format!("cannot connect to {}", self.base_url))
            } else if e.is_timeout() {
                LedgerError::Transport(format!("request to {} timed out", self.base_url))
            } else {
                LedgerError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LedgerError::Http {
                status: status.as_u16(),
            });
        }

        let envelope: RpcEnvelope<T> = response
            .json()
            .await
            .map_err(|e| LedgerError::Parse(e.to_string()))?;
        envelope.into_result()
    }
}

#[async_trait]
impl LedgerQuery for HttpLedgerClient {
    async fn get_transaction(&self, tx_hash: &str) -> Result<TxRecord, LedgerError> {
        self.get(&self.tx_url(tx_hash)).await
    }

    async fn query_state(&self, key: &StateKey) -> Result<StateRecord, LedgerError> {
        self.get(&self.state_url(key)).await
    }
}
