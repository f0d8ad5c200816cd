//! Confirmation resolver: turns an agent transaction status into a final
//! ledger outcome.

use crate::domain::backoff::{poll_until_found, BackoffPolicy};
use crate::domain::codec::{agent_errors, decode_tx_record};
use crate::domain::outcome::TransactionOutcome;
use crate::error::{BridgeError, BridgeResult};
use crate::ports::outbound::LedgerQuery;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Polls the ledger for a submitted transaction and decodes the result.
///
/// Cheap to clone; every poll sequence owns its own backoff state.
#[derive(Clone)]
pub struct ConfirmationResolver {
    ledger: Arc<dyn LedgerQuery>,
    policy: BackoffPolicy,
}

impl ConfirmationResolver {
    /// Create a resolver.
    pub fn new(ledger: Arc<dyn LedgerQuery>, policy: BackoffPolicy) -> Self {
        Self { ledger, policy }
    }

    /// Polling policy in use.
    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Interpret a transaction status detail from the agent.
    ///
    /// An `errors` marker rejects immediately without touching the ledger;
    /// a `txid` is polled until confirmed or the budget runs out.
    pub async fn resolve(&self, detail: &Value) -> BridgeResult<TransactionOutcome> {
        if let Some(errors) = agent_errors(detail) {
            info!(errors = %errors, "Wallet rejected transaction");
            return Ok(TransactionOutcome::AgentRejected {
                errors: errors.clone(),
            });
        }

        let tx_hash = detail
            .get("txid")
            .and_then(Value::as_str)
            .filter(|hash| !hash.trim().is_empty())
            .ok_or_else(|| {
                BridgeError::Decode(format!("transaction status without txid or errors: {detail}"))
            })?;

        self.confirm(tx_hash).await
    }

    /// Poll the ledger for `tx_hash` with backoff.
    ///
    /// Exhausting the budget is an `Unconfirmed` outcome, not an error: the
    /// transaction may still finalize later.
    pub async fn confirm(&self, tx_hash: &str) -> BridgeResult<TransactionOutcome> {
        debug!(
            tx_hash = tx_hash,
            max_retries = self.policy.max_retries,
            "Polling ledger for transaction"
        );

        match poll_until_found(&self.policy, || self.ledger.get_transaction(tx_hash)).await {
            Ok(record) => {
                let confirmed = decode_tx_record(tx_hash, &record)?;
                info!(
                    tx_hash = tx_hash,
                    height = ?confirmed.height,
                    code = confirmed.code,
                    "Transaction confirmed"
                );
                Ok(TransactionOutcome::Confirmed(confirmed))
            }
            Err(last_error) => {
                warn!(
                    tx_hash = tx_hash,
                    error = %last_error,
                    "Transaction not confirmed after retries"
                );
                Ok(TransactionOutcome::Unconfirmed {
                    tx_hash: tx_hash.to_string(),
                    last_error,
                })
            }
        }
    }
}
