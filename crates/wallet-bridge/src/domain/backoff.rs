//! Exponential backoff polling against an eventually-consistent lookup.
//!
//! The ledger only indexes a transaction some time after the agent reports
//! it as sent, so a lookup is retried with a doubling delay until it
//! succeeds or the retry budget runs out. "Not indexed yet" and transport
//! failures are retried identically.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retry policy for [`poll_until_found`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    /// Delay before the first retry, doubled after every failure
    pub initial_delay_ms: u64,
    /// Retries after the initial attempt
    pub max_retries: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            max_retries: 5,
        }
    }
}

impl BackoffPolicy {
    /// Create a policy.
    pub fn new(initial_delay: Duration, max_retries: u32) -> Self {
        Self {
            initial_delay_ms: u64::try_from(initial_delay.as_millis()).unwrap_or(u64::MAX),
            max_retries,
        }
    }

    /// Delay before the first retry.
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Sum of every delay when the budget is fully spent.
    pub fn worst_case_delay(&self) -> Duration {
        let mut attempt = self.start();
        let mut total = Duration::ZERO;
        while let Some(delay) = attempt.next_delay() {
            total = total.saturating_add(delay);
        }
        total
    }

    /// Fresh mutable state for one polling sequence.
    pub fn start(&self) -> BackoffAttempt {
        BackoffAttempt {
            remaining: self.max_retries,
            delay: self.initial_delay(),
        }
    }
}

/// Counter state owned by a single polling sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffAttempt {
    remaining: u32,
    delay: Duration,
}

impl BackoffAttempt {
    /// Retries still available.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Consume one retry, returning how long to wait before it.
    ///
    /// Returns `None` once the budget is exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        let delay = self.delay;
        self.remaining -= 1;
        self.delay = self.delay.saturating_mul(2);
        Some(delay)
    }
}

/// Attempt `lookup` until it succeeds, sleeping with a doubling delay
/// between failures.
///
/// Makes at most `max_retries + 1` attempts and propagates the last error
/// when the budget is exhausted.
pub async fn poll_until_found<T, E, F, Fut>(policy: &BackoffPolicy, mut lookup: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = policy.start();

    loop {
        let error = match lookup().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        let Some(delay) = attempt.next_delay() else {
            debug!(error = %error, "Backoff budget exhausted");
            return Err(error);
        };

        debug!(
            error = %error,
            delay_ms = delay.as_millis(),
            remaining = attempt.remaining(),
            "Lookup failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
