//! Ports module for the wallet bridge

pub mod inbound;
pub mod outbound;

pub use inbound::{WalletApi, NATIVE_CURRENCY};
pub use outbound::LedgerQuery;
