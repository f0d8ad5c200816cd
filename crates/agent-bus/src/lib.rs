//! # Agent Bus - Event Channel to the Signing Agent
//!
//! Models the only transport the wallet agent understands: named,
//! fire-and-forget events carrying an untyped JSON payload.
//!
//! ## Dispatch Pattern
//!
//! ```text
//! ┌──────────────┐  publish(GetInfo)     ┌──────────────┐
//! │    Bridge    │ ───────┐              │    Agent     │
//! │              │        ▼              │  (extension) │
//! └──────────────┘  ┌──────────────┐     └──────────────┘
//!        ↑          │  Event Bus   │ ◄──────────┘
//!        └───────── │              │  publish(WalletInfo)
//!     subscribe()   └──────────────┘
//! ```
//!
//! There is no request/response pairing at this layer. Correlation is the
//! job of the consumer.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{AgentEvent, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
