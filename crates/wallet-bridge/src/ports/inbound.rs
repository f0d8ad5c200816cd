//! Driving Ports (API - Inbound)

use crate::domain::outcome::TransactionOutcome;
use crate::domain::readiness::Readiness;
use crate::domain::types::{SignatureResponse, TransactionRequest, WalletInfo};
use crate::error::BridgeResult;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Contract holding the native currency balances.
pub const NATIVE_CURRENCY: &str = "currency";

/// Primary wallet bridge API
///
/// Every agent request waits for readiness first, then for the matching
/// response or the kind's timeout. Each call settles exactly once.
#[async_trait]
pub trait WalletApi: Send + Sync {
    /// Wait until the agent announced readiness, or the fallback elapsed.
    async fn wait_until_ready(&self) -> Readiness;

    /// Address and metadata of the connected wallet.
    async fn request_wallet_info(&self) -> BridgeResult<WalletInfo>;

    /// Ask the agent to sign `message`.
    async fn sign_message(&self, message: &str) -> BridgeResult<SignatureResponse>;

    /// Ask the agent to sign and submit a contract call, then wait for the
    /// ledger to finalize it.
    ///
    /// `Err` is reserved for agent absence, shutdown and undecodable
    /// payloads; rejection and non-confirmation are outcomes.
    async fn send_transaction(&self, request: TransactionRequest) -> BridgeResult<TransactionOutcome>;

    /// Balance of `address` in `contract`, read straight from the ledger.
    /// An empty slot is zero.
    async fn balance_of(&self, address: &str, contract: &str) -> BridgeResult<Decimal>;

    /// Amount `owner` approved `spender` to move in `contract`, read straight
    /// from the ledger. An empty slot is zero.
    async fn approved_balance_of(
        &self,
        contract: &str,
        owner: &str,
        spender: &str,
    ) -> BridgeResult<Decimal>;

    /// Balance of the connected wallet in `contract`.
    async fn get_balance(&self, contract: &str) -> BridgeResult<Decimal> {
        let info = self.request_wallet_info().await?;
        self.balance_of(&info.address, contract).await
    }

    /// Amount the connected wallet approved `approved_to` to move in
    /// `token_contract`.
    async fn get_approved_balance(
        &self,
        token_contract: &str,
        approved_to: &str,
    ) -> BridgeResult<Decimal> {
        let info = self.request_wallet_info().await?;
        self.approved_balance_of(token_contract, &info.address, approved_to)
            .await
    }
}
