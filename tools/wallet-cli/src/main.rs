//! wallet-cli: ledger queries from the terminal.
//!
//! Talks to the ledger query service directly; no wallet agent is
//! involved, so only the read side of the bridge is available here.
//!
//! ## Usage
//!
//! ```bash
//! # Native currency balance
//! wallet-cli balance --address e787ed59...
//!
//! # Allowance of a token
//! wallet-cli approved-balance --contract con_token --owner e787ed59... --spender con_dex
//!
//! # Wait for a transaction to be finalized
//! wallet-cli --rpc-url http://localhost:26657 tx 5F0C...
//! ```

mod logging;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use wallet_bridge::{
    read_balance, BackoffPolicy, BridgeConfig, ConfirmationResolver, HttpLedgerClient,
    LedgerQuery, StateKey, TransactionOutcome, DEFAULT_RPC_URL, NATIVE_CURRENCY,
};

/// Xian ledger queries
#[derive(Parser, Debug)]
#[command(name = "wallet-cli")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ledger query service URL
    #[arg(long, env = "XIAN_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,

    /// Per-request HTTP timeout in milliseconds
    #[arg(long, default_value = "10000")]
    http_timeout_ms: u64,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Balance of an address
    Balance {
        /// Token contract
        #[arg(long, default_value = NATIVE_CURRENCY)]
        contract: String,
        /// Account address
        #[arg(long)]
        address: String,
    },
    /// Amount an owner approved a spender to move
    ApprovedBalance {
        /// Token contract
        #[arg(long, default_value = NATIVE_CURRENCY)]
        contract: String,
        /// Approving account
        #[arg(long)]
        owner: String,
        /// Approved account or contract
        #[arg(long)]
        spender: String,
    },
    /// Poll for a transaction until it is finalized
    Tx {
        /// Transaction hash (hex, with or without 0x)
        hash: String,
        /// Retries after the first lookup
        #[arg(long, default_value = "5")]
        retries: u32,
        /// Delay before the first retry, doubled after each failure
        #[arg(long, default_value = "1000")]
        initial_delay_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.json_logs)?;

    let mut config = BridgeConfig::default().with_rpc_url(args.rpc_url);
    config.http_timeout_ms = args.http_timeout_ms;
    config.validate().context("invalid configuration")?;

    let ledger: Arc<dyn LedgerQuery> = Arc::new(
        HttpLedgerClient::from_config(&config).context("failed to build ledger client")?,
    );
    info!(rpc_url = %config.base_url(), "Using ledger");

    let output = match args.command {
        Command::Balance { contract, address } => {
            let key = StateKey::balance(&contract, &address);
            let balance = read_balance(ledger.as_ref(), &key)
                .await
                .with_context(|| format!("failed to read {key}"))?;
            json!({ "contract": contract, "address": address, "balance": balance })
        }
        Command::ApprovedBalance {
            contract,
            owner,
            spender,
        } => {
            let key = StateKey::approval(&contract, &owner, &spender);
            let balance = read_balance(ledger.as_ref(), &key)
                .await
                .with_context(|| format!("failed to read {key}"))?;
            json!({
                "contract": contract,
                "owner": owner,
                "spender": spender,
                "approved": balance
            })
        }
        Command::Tx {
            hash,
            retries,
            initial_delay_ms,
        } => {
            let policy = BackoffPolicy::new(Duration::from_millis(initial_delay_ms), retries);
            let resolver = ConfirmationResolver::new(ledger, policy);
            let outcome = resolver
                .confirm(&hash)
                .await
                .with_context(|| format!("failed to decode transaction {hash}"))?;

            match outcome {
                TransactionOutcome::Confirmed(tx) => serde_json::to_value(&tx)?,
                TransactionOutcome::Unconfirmed {
                    tx_hash,
                    last_error,
                } => json!({
                    "hash": tx_hash,
                    "confirmed": false,
                    "last_error": last_error.to_string()
                }),
                TransactionOutcome::AgentRejected { errors } => json!({ "errors": errors }),
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
