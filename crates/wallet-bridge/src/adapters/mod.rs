//! Adapters implementing the outbound ports.

pub mod http_ledger;

pub use http_ledger::HttpLedgerClient;
