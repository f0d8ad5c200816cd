//! # Request Correlation Flows
//!
//! Matching of agent responses to pending callers: exactly-once settlement
//! under same-kind concurrency, routing by echoed id, FIFO fallback, and
//! tolerance of responses nobody asked for.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use agent_bus::{AgentEvent, EventPublisher};
    use serde_json::json;
    use wallet_bridge::testing::{ScriptedLedger, SimulatedAgent};
    use wallet_bridge::{BridgeError, CorrelationId, RequestKind, WalletApi};

    use crate::integration::{started_bridge, WALLET_ADDRESS};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Agent that collects sign requests and answers them in reverse order
    /// once `batch` have arrived.
    fn reversing_signer(
        bus: &Arc<agent_bus::InMemoryEventBus>,
        batch: usize,
        echo_ids: bool,
    ) -> SimulatedAgent {
        let mut held: Vec<(String, String)> = Vec::new();
        SimulatedAgent::spawn(Arc::clone(bus), move |request| {
            let AgentEvent::SignMessage {
                request_id,
                message,
            } = request
            else {
                return vec![];
            };
            held.push((request_id.clone(), message.clone()));
            if held.len() < batch {
                return vec![];
            }

            held.drain(..)
                .rev()
                .map(|(request_id, message)| {
                    let mut detail = json!({ "signature": format!("sig:{message}") });
                    if echo_ids {
                        detail["request_id"] = json!(request_id);
                    }
                    AgentEvent::SignMessageResponse(detail)
                })
                .collect()
        })
    }

    // =============================================================================
    // EXACTLY-ONCE SETTLEMENT
    // =============================================================================

    /// N concurrent wallet-info requests produce exactly N settlements
    #[tokio::test(start_paused = true)]
    async fn test_concurrent_same_kind_requests_settle_once_each() {
        const N: usize = 8;

        let (bridge, bus) = started_bridge(Arc::new(ScriptedLedger::new()));
        let _agent = SimulatedAgent::spawn(Arc::clone(&bus), |request| match request {
            AgentEvent::GetInfo { .. } => {
                vec![AgentEvent::WalletInfo(json!({ "address": WALLET_ADDRESS }))]
            }
            _ => vec![],
        });
        SimulatedAgent::announce_ready(&bus).await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        let bridge = Arc::new(bridge);
        let handles: Vec<_> = (0..N)
            .map(|_| {
                let bridge = Arc::clone(&bridge);
                tokio::spawn(async move { bridge.request_wallet_info().await })
            })
            .collect();

        for handle in handles {
            let info = handle.await.unwrap().unwrap();
            assert_eq!(info.address, WALLET_ADDRESS);
        }

        let stats = bridge.stats().wallet_info;
        assert_eq!(stats.registered, N as u64);
        assert_eq!(stats.settled, N as u64);
        assert_eq!(stats.timed_out, 0);
        assert_eq!(stats.pending, 0);
    }

    /// Some requests answered, the rest time out; nothing settles twice
    #[tokio::test(start_paused = true)]
    async fn test_partial_answers_and_timeouts_account_for_every_request() {
        let (bridge, bus) = started_bridge(Arc::new(ScriptedLedger::new()));
        let mut answered = 0;
        let _agent = SimulatedAgent::spawn(Arc::clone(&bus), move |request| match request {
            AgentEvent::GetInfo { .. } if answered < 2 => {
                answered += 1;
                vec![AgentEvent::WalletInfo(json!({ "address": WALLET_ADDRESS }))]
            }
            _ => vec![],
        });
        SimulatedAgent::announce_ready(&bus).await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        let bridge = Arc::new(bridge);
        let handles: Vec<_> = (0..5)
            .map(|_| {
                let bridge = Arc::clone(&bridge);
                tokio::spawn(async move { bridge.request_wallet_info().await })
            })
            .collect();

        let mut ok = 0;
        let mut absent = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(BridgeError::AgentAbsent { kind, .. }) => {
                    assert_eq!(kind, RequestKind::WalletInfo);
                    absent += 1;
                }
                Err(other) => panic!("unexpected error {other}"),
            }
        }

        assert_eq!((ok, absent), (2, 3));
        let stats = bridge.stats().wallet_info;
        assert_eq!(stats.settled, 2);
        assert_eq!(stats.timed_out, 3);
        assert_eq!(stats.pending, 0);
    }

    // =============================================================================
    // ROUTING
    // =============================================================================

    /// An agent that echoes request ids gets exact routing even out of order
    #[tokio::test(start_paused = true)]
    async fn test_echoed_ids_route_out_of_order_responses() {
        let (bridge, bus) = started_bridge(Arc::new(ScriptedLedger::new()));
        let _agent = reversing_signer(&bus, 2, true);
        SimulatedAgent::announce_ready(&bus).await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        let (first, second) = tokio::join!(bridge.sign_message("one"), bridge.sign_message("two"));

        assert_eq!(first.unwrap().signature, "sig:one");
        assert_eq!(second.unwrap().signature, "sig:two");
    }

    /// Without echoed ids responses are matched FIFO, whatever they contain
    #[tokio::test(start_paused = true)]
    async fn test_fifo_matching_without_echo() {
        let (bridge, bus) = started_bridge(Arc::new(ScriptedLedger::new()));
        let _agent = reversing_signer(&bus, 2, false);
        SimulatedAgent::announce_ready(&bus).await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        let (first, second) = tokio::join!(bridge.sign_message("one"), bridge.sign_message("two"));

        // The agent answered "two" first, so the oldest caller receives it
        assert_eq!(first.unwrap().signature, "sig:two");
        assert_eq!(second.unwrap().signature, "sig:one");
    }

    /// A response echoing an id nobody is waiting for is dropped, not
    /// handed to the head of the queue
    #[tokio::test(start_paused = true)]
    async fn test_unknown_echoed_id_is_dropped() {
        let (bridge, bus) = started_bridge(Arc::new(ScriptedLedger::new()));
        SimulatedAgent::announce_ready(&bus).await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        let stray = CorrelationId::new();
        let publisher = Arc::clone(&bus);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            publisher
                .publish(AgentEvent::WalletInfo(json!({
                    "address": WALLET_ADDRESS,
                    "request_id": stray.to_string()
                })))
                .await;
        });

        let err = bridge.request_wallet_info().await.unwrap_err();
        assert!(matches!(err, BridgeError::AgentAbsent { .. }));

        let stats = bridge.stats().wallet_info;
        assert_eq!(stats.spurious, 1);
        assert_eq!(stats.timed_out, 1);
    }

    /// A caller that gives up does not swallow the reply meant for the next one
    #[tokio::test(start_paused = true)]
    async fn test_abandoned_request_does_not_capture_next_reply() {
        let (bridge, bus) = started_bridge(Arc::new(ScriptedLedger::new()));
        SimulatedAgent::announce_ready(&bus).await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        let abandoned =
            tokio::time::timeout(Duration::from_millis(100), bridge.request_wallet_info()).await;
        assert!(abandoned.is_err());
        assert_eq!(bridge.stats().wallet_info.pending, 1);

        let _agent = SimulatedAgent::spawn(Arc::clone(&bus), |request| match request {
            AgentEvent::GetInfo { .. } => {
                vec![AgentEvent::WalletInfo(json!({ "address": WALLET_ADDRESS }))]
            }
            _ => vec![],
        });

        let info = bridge.request_wallet_info().await.unwrap();
        assert_eq!(info.address, WALLET_ADDRESS);

        // Well past the abandoned entry's timeout: it was discarded, not expired
        tokio::time::sleep(Duration::from_secs(5)).await;
        let stats = bridge.stats().wallet_info;
        assert_eq!(stats.registered, 2);
        assert_eq!(stats.settled, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.timed_out, 0);
        assert_eq!(stats.pending, 0);
    }

    /// Responses with nothing pending are counted and ignored
    #[tokio::test(start_paused = true)]
    async fn test_spurious_chatter_does_not_poison_later_requests() {
        let (bridge, bus) = started_bridge(Arc::new(ScriptedLedger::new()));
        SimulatedAgent::announce_ready(&bus).await;

        bus.publish(AgentEvent::WalletInfo(json!({ "address": "stale" })))
            .await;
        bus.publish(AgentEvent::TransactionStatus(json!({ "txid": "stale" })))
            .await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        let _agent = SimulatedAgent::spawn(Arc::clone(&bus), |request| match request {
            AgentEvent::GetInfo { .. } => {
                vec![AgentEvent::WalletInfo(json!({ "address": WALLET_ADDRESS }))]
            }
            _ => vec![],
        });

        let info = bridge.request_wallet_info().await.unwrap();
        assert_eq!(info.address, WALLET_ADDRESS);

        let stats = bridge.stats();
        assert_eq!(stats.wallet_info.spurious, 1);
        assert_eq!(stats.transaction.spurious, 1);
        assert_eq!(stats.total().settled, 1);
    }
}
