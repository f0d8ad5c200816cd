//! Balance reads straight from contract state.

use crate::domain::codec::{decode_state_value, parse_balance};
use crate::domain::ledger::StateKey;
use crate::error::BridgeResult;
use crate::ports::outbound::LedgerQuery;
use rust_decimal::Decimal;
use tracing::debug;

/// Read a balance-like state slot. An empty slot is zero.
pub async fn read_balance(ledger: &dyn LedgerQuery, key: &StateKey) -> BridgeResult<Decimal> {
    let record = ledger.query_state(key).await?;

    let balance = match decode_state_value(record.response.value.as_deref())? {
        Some(text) => parse_balance(&text)?,
        None => Decimal::ZERO,
    };

    debug!(key = %key, balance = %balance, "Read balance");
    Ok(balance)
}
