//! # Ledger Over HTTP
//!
//! The bridge built with `WalletBridge::connect` against an in-process
//! query service: balance reads, allowance reads and a transaction that is
//! already finalized when the agent reports it.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::str::FromStr;
    use std::sync::Arc;

    use agent_bus::{AgentEvent, InMemoryEventBus};
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use wallet_bridge::testing::{encode_original, SimulatedAgent};
    use wallet_bridge::{
        BridgeConfig, BridgeError, LedgerError, TransactionOutcome, TransactionRequest, WalletApi,
        WalletBridge, NATIVE_CURRENCY,
    };

    use crate::integration::WALLET_ADDRESS;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn rpc_result(result: Value) -> Json<Value> {
        Json(json!({ "jsonrpc": "2.0", "id": -1, "result": result }))
    }

    async fn tx_handler(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
        match params.get("hash").map(String::as_str) {
            Some("0xFEED01") => {
                let original = json!({
                    "payload": { "contract": "currency", "function": "transfer" }
                });
                (
                    StatusCode::OK,
                    rpc_result(json!({
                        "hash": "FEED01",
                        "height": "481",
                        "tx_result": { "code": 0, "data": "eyJvayI6dHJ1ZX0=" },
                        "tx": encode_original(&original)
                    })),
                )
            }
            _ => (
                StatusCode::OK,
                Json(json!({
                    "jsonrpc": "2.0",
                    "id": -1,
                    "error": { "code": -32603, "message": "Internal error", "data": "tx not found" }
                })),
            ),
        }
    }

    async fn abci_handler(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
        let path = params.get("path").cloned().unwrap_or_default();
        let value = if path == format!("\"/get/currency.balances:{WALLET_ADDRESS}\"") {
            // "1250.75"
            "MTI1MC43NQ=="
        } else if path == format!("\"/get/con_token.balances:{WALLET_ADDRESS}:con_dex\"") {
            // {"__fixed__": "42.125"}
            "eyJfX2ZpeGVkX18iOiAiNDIuMTI1In0="
        } else if path.contains("con_broken") {
            return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({}))).into_response();
        } else {
            "AA=="
        };

        rpc_result(json!({ "response": { "code": 0, "value": value, "log": "" } })).into_response()
    }

    /// Serve the query service on an ephemeral port and connect a bridge to it.
    async fn connected_bridge() -> (WalletBridge, Arc<InMemoryEventBus>) {
        let router = Router::new()
            .route("/tx", get(tx_handler))
            .route("/abci_query", get(abci_handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let mut config = BridgeConfig::default().with_rpc_url(format!("http://{addr}"));
        config.bus_capacity = 64;
        let (bridge, bus) = WalletBridge::open(config).unwrap();
        assert_eq!(bus.capacity(), 64);
        bridge.start();
        (bridge, bus)
    }

    fn wallet_agent(bus: &Arc<InMemoryEventBus>) -> SimulatedAgent {
        SimulatedAgent::spawn(Arc::clone(bus), |request| match request {
            AgentEvent::GetInfo { .. } => {
                vec![AgentEvent::WalletInfo(json!({ "address": WALLET_ADDRESS }))]
            }
            AgentEvent::SendTransaction { .. } => {
                vec![AgentEvent::TransactionStatus(json!({ "txid": "feed01" }))]
            }
            _ => vec![],
        })
    }

    // =============================================================================
    // BALANCES
    // =============================================================================

    #[tokio::test]
    async fn test_balance_of_address() {
        let (bridge, _bus) = connected_bridge().await;

        let balance = bridge
            .balance_of(WALLET_ADDRESS, NATIVE_CURRENCY)
            .await
            .unwrap();
        assert_eq!(balance, Decimal::from_str("1250.75").unwrap());
    }

    #[tokio::test]
    async fn test_empty_slot_reads_zero() {
        let (bridge, _bus) = connected_bridge().await;

        let balance = bridge.balance_of("nobody", NATIVE_CURRENCY).await.unwrap();
        assert_eq!(balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_connected_wallet_balances() {
        let (bridge, bus) = connected_bridge().await;
        let _agent = wallet_agent(&bus);
        SimulatedAgent::announce_ready(&bus).await;

        let balance = bridge.get_balance(NATIVE_CURRENCY).await.unwrap();
        assert_eq!(balance, Decimal::from_str("1250.75").unwrap());

        let approved = bridge
            .get_approved_balance("con_token", "con_dex")
            .await
            .unwrap();
        assert_eq!(approved, Decimal::from_str("42.125").unwrap());

        assert_eq!(bridge.stats().wallet_info.settled, 2);
    }

    #[tokio::test]
    async fn test_query_service_failure_is_ledger_error() {
        let (bridge, _bus) = connected_bridge().await;

        let err = bridge
            .approved_balance_of("con_broken", WALLET_ADDRESS, "con_dex")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Ledger(LedgerError::Http { status: 503 })
        ));
    }

    // =============================================================================
    // TRANSACTIONS
    // =============================================================================

    #[tokio::test]
    async fn test_transaction_confirmed_on_first_lookup() {
        let (bridge, bus) = connected_bridge().await;
        let _agent = wallet_agent(&bus);
        SimulatedAgent::announce_ready(&bus).await;

        let request = TransactionRequest::new(
            NATIVE_CURRENCY,
            "transfer",
            json!({ "amount": 1, "to": "burn" }),
        );
        let outcome = bridge.send_transaction(request).await.unwrap();

        let TransactionOutcome::Confirmed(tx) = outcome else {
            panic!("expected confirmed transaction, got {outcome:?}");
        };
        assert_eq!(tx.hash, "FEED01");
        assert_eq!(tx.height, Some(481));
        assert_eq!(tx.code, 0);
        assert_eq!(tx.result["ok"], json!(true));
        assert_eq!(tx.original_tx["payload"]["function"], json!("transfer"));
    }
}
