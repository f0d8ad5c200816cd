//! Service layer: the bridge engine and its collaborators.

pub mod balance;
pub mod bridge;
pub mod resolver;

pub use balance::read_balance;
pub use bridge::{BridgeStats, WalletBridge};
pub use resolver::ConfirmationResolver;
