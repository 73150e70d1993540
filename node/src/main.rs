// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Quill Devnet Node
//!
//! Entry point for the `quill-node` binary. Parses CLI arguments,
//! initializes logging, and drives the protocol core end-to-end against a
//! local chain store.
//!
//! The binary supports four subcommands:
//!
//! - `keygen`  — derive a wallet from a passphrase
//! - `send`    — construct, sign, submit, and confirm a message transaction
//! - `list`    — list confirmed messages for a recipient
//! - `version` — print build version information
//!
//! This is a devnet exerciser: account balances live in memory and are
//! seeded from a faucet on each run, while messages persist in the sled
//! store under the data directory. There is no RPC server and no peer — the
//! point is to watch the settlement core do its job locally.

mod cli;
mod logging;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;

use quill_protocol::asset::{AddMessageRequest, AssetRegistry, MessageHandler};
use quill_protocol::config::MESSAGE_FEE;
use quill_protocol::crypto::{address_from_public_key, derive_id, QuillKeypair};
use quill_protocol::dispatcher::Dispatcher;
use quill_protocol::ledger::MemoryLedger;
use quill_protocol::storage::SledStore;

use cli::{Commands, QuillNodeCli};
use logging::LogFormat;

/// Devnet faucet balance in base units: plenty for a demo session.
const FAUCET_BALANCE: u64 = 100 * MESSAGE_FEE;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = QuillNodeCli::parse();
    logging::init_logging("quill_node=info,quill_protocol=info", LogFormat::Pretty);

    match cli.command {
        Commands::Keygen(args) => keygen(args),
        Commands::Send(args) => send(args).await,
        Commands::List(args) => list(args).await,
        Commands::Version => {
            println!("quill-node {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// The full stack wired from one composition root: in-memory ledger,
/// persistent chain store, registry with the message asset attached, and
/// the dispatcher on top.
fn compose(
    data_dir: &std::path::Path,
) -> Result<(Arc<MessageHandler>, Dispatcher, Arc<MemoryLedger>)> {
    let db_path = data_dir.join("db");
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create data directory: {}", db_path.display()))?;

    let ledger = Arc::new(MemoryLedger::new());
    let store = Arc::new(
        SledStore::open(&db_path)
            .with_context(|| format!("failed to open chain store at {}", db_path.display()))?,
    );
    let handler = Arc::new(MessageHandler::new(ledger.clone(), store.clone()));

    let mut registry = AssetRegistry::new();
    registry
        .attach(handler.clone())
        .context("failed to attach message asset")?;

    let dispatcher = Dispatcher::new(Arc::new(registry), ledger.clone(), store);
    Ok((handler, dispatcher, ledger))
}

/// Derive and print a wallet from a passphrase.
fn keygen(args: cli::KeygenArgs) -> Result<()> {
    let keypair = QuillKeypair::from_passphrase(&args.passphrase);
    let wallet = json!({
        "address": address_from_public_key(&keypair.public_key()),
        "publicKey": keypair.public_key_hex(),
        "privateKey": keypair.private_key_hex(),
    });
    println!("{}", serde_json::to_string_pretty(&wallet)?);
    Ok(())
}

/// Construct, sign, submit, and confirm a message transaction.
async fn send(args: cli::SendArgs) -> Result<()> {
    let (handler, dispatcher, ledger) = compose(&args.data_dir)?;

    // Devnet faucet: fund the sender so the tentative-balance check passes.
    let sender = address_from_public_key(
        &QuillKeypair::from_passphrase(&args.passphrase).public_key(),
    );
    ledger.seed(&sender, FAUCET_BALANCE);
    tracing::info!(%sender, balance = FAUCET_BALANCE, "faucet funded sender");

    let tx = handler
        .add(
            &dispatcher,
            AddMessageRequest {
                recipient_id: args.recipient,
                passphrase: args.passphrase,
                message: args.message,
            },
        )
        .await
        .context("transaction rejected")?;

    // Immediately "forge" the transaction into a devnet block.
    let block_id = derive_id(tx.id.as_bytes());
    let confirmed = dispatcher
        .confirm(&tx.id, &block_id)
        .await
        .context("confirmation failed")?;

    println!("{}", serde_json::to_string_pretty(&confirmed)?);
    Ok(())
}

/// List confirmed messages addressed to a recipient.
async fn list(args: cli::ListArgs) -> Result<()> {
    let (handler, _dispatcher, _ledger) = compose(&args.data_dir)?;

    let messages = handler
        .list(&args.recipient)
        .await
        .context("listing failed")?;
    tracing::info!(recipient = %args.recipient, count = messages.len(), "messages fetched");

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "messages": messages }))?
    );
    Ok(())
}
