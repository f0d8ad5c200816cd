//! # Wallet Bridge Test Suite
//!
//! End-to-end flows driving `WalletBridge` against a simulated agent on
//! the event bus and a scripted (or HTTP) ledger.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── correlation.rs   # Same-kind concurrency, echoed ids, spurious events
//!     ├── readiness.rs     # Ready announcement and fallback
//!     ├── transactions.rs  # Confirmation polling, rejection, exhaustion
//!     └── ledger_http.rs   # Balances through the HTTP adapter
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p bridge-tests
//! cargo test -p bridge-tests integration::transactions::
//! ```

pub mod integration;
