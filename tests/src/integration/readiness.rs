//! # Agent Readiness Flows
//!
//! The bridge waits for the agent's ready announcement, but never longer
//! than the fallback, and the wait counts against the request's timeout.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use agent_bus::AgentEvent;
    use serde_json::json;
    use tokio::time::Instant;
    use wallet_bridge::testing::{ScriptedLedger, SimulatedAgent};
    use wallet_bridge::{BridgeError, Readiness, RequestKind, WalletApi};

    use crate::integration::{started_bridge, WALLET_ADDRESS};

    // =============================================================================
    // READINESS GATE
    // =============================================================================

    /// No announcement: the wait gives up after the 2s fallback
    #[tokio::test(start_paused = true)]
    async fn test_wait_falls_back_after_two_seconds() {
        let (bridge, _bus) = started_bridge(Arc::new(ScriptedLedger::new()));

        let start = Instant::now();
        let readiness = bridge.wait_until_ready().await;

        assert_eq!(readiness, Readiness::FallbackElapsed);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        assert!(!bridge.stats().ready);
    }

    /// An announcement mid-wait releases every waiter at once
    #[tokio::test(start_paused = true)]
    async fn test_ready_announcement_releases_waiters() {
        let (bridge, bus) = started_bridge(Arc::new(ScriptedLedger::new()));

        let announcer = Arc::clone(&bus);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            SimulatedAgent::announce_ready(&announcer).await;
        });

        let start = Instant::now();
        let (first, second) = tokio::join!(bridge.wait_until_ready(), bridge.wait_until_ready());

        assert_eq!(first, Readiness::Ready);
        assert_eq!(second, Readiness::Ready);
        assert_eq!(start.elapsed(), Duration::from_millis(300));
        assert!(bridge.stats().ready);
    }

    /// Once ready, later waits return without suspending
    #[tokio::test(start_paused = true)]
    async fn test_ready_is_sticky() {
        let (bridge, bus) = started_bridge(Arc::new(ScriptedLedger::new()));
        SimulatedAgent::announce_ready(&bus).await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        let start = Instant::now();
        assert_eq!(bridge.wait_until_ready().await, Readiness::Ready);
        assert_eq!(bridge.wait_until_ready().await, Readiness::Ready);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    // =============================================================================
    // REQUESTS AND READINESS
    // =============================================================================

    /// No agent at all: wallet info fails within 2.2s, not fallback + timeout
    #[tokio::test(start_paused = true)]
    async fn test_wallet_info_without_agent_fails_fast() {
        let (bridge, _bus) = started_bridge(Arc::new(ScriptedLedger::new()));

        let start = Instant::now();
        let err = bridge.request_wallet_info().await.unwrap_err();

        assert!(start.elapsed() <= Duration::from_millis(2_200));
        assert!(matches!(
            err,
            BridgeError::AgentAbsent {
                kind: RequestKind::WalletInfo,
                ..
            }
        ));
        assert_eq!(err.to_string(), "Xian Wallet Chrome extension not responding");
    }

    /// An agent that never announces itself can still answer after the fallback
    #[tokio::test(start_paused = true)]
    async fn test_silent_agent_still_answers() {
        let (bridge, bus) = started_bridge(Arc::new(ScriptedLedger::new()));
        let _agent = SimulatedAgent::spawn(Arc::clone(&bus), |request| match request {
            AgentEvent::GetInfo { .. } => {
                vec![AgentEvent::WalletInfo(json!({ "address": WALLET_ADDRESS }))]
            }
            _ => vec![],
        });

        let start = Instant::now();
        let info = bridge.request_wallet_info().await.unwrap();

        assert_eq!(info.address, WALLET_ADDRESS);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        assert!(!bridge.stats().ready);
    }

    /// A late announcement shortens the wait for a request already queued
    #[tokio::test(start_paused = true)]
    async fn test_request_dispatched_on_announcement() {
        let (bridge, bus) = started_bridge(Arc::new(ScriptedLedger::new()));
        let _agent = SimulatedAgent::spawn(Arc::clone(&bus), |request| match request {
            AgentEvent::SignMessage { message, .. } => {
                vec![AgentEvent::SignMessageResponse(
                    json!({ "signature": format!("sig:{message}") }),
                )]
            }
            _ => vec![],
        });

        let announcer = Arc::clone(&bus);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(750)).await;
            SimulatedAgent::announce_ready(&announcer).await;
        });

        let start = Instant::now();
        let signed = bridge.sign_message("hello").await.unwrap();

        assert_eq!(signed.signature, "sig:hello");
        assert_eq!(start.elapsed(), Duration::from_millis(750));
    }
}
