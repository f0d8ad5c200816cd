//! Driven Ports (SPI - Outbound Dependencies)

use crate::domain::ledger::{LedgerError, StateKey, StateRecord, TxRecord};
use async_trait::async_trait;

/// Read access to the ledger query service.
///
/// Implementations report "not indexed yet" as [`LedgerError::NotFound`];
/// the caller decides whether to retry.
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    /// Look up a transaction by hash (hex, without `0x`).
    async fn get_transaction(&self, tx_hash: &str) -> Result<TxRecord, LedgerError>;

    /// Read one contract state slot.
    async fn query_state(&self, key: &StateKey) -> Result<StateRecord, LedgerError>;
}
