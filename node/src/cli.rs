//! # CLI Interface
//!
//! Defines the command-line argument structure for `quill-node` using
//! `clap` derive. Supports four subcommands: `keygen`, `send`, `list`,
//! and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Quill Protocol devnet node.
///
/// A local exerciser for the Quill message ledger: derive wallets from
/// passphrases, send message transactions through the full lifecycle, and
/// read them back. Devnet only — balances are seeded from a faucet, not
/// earned.
#[derive(Parser, Debug)]
#[command(
    name = "quill-node",
    about = "Quill Protocol devnet node",
    version,
    propagate_version = true
)]
pub struct QuillNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the quill-node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Derive a wallet (keypair and address) from a passphrase.
    Keygen(KeygenArgs),
    /// Construct, sign, submit, and confirm a message transaction.
    Send(SendArgs),
    /// List confirmed messages addressed to a recipient.
    List(ListArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `keygen` subcommand.
#[derive(Parser, Debug)]
pub struct KeygenArgs {
    /// Wallet passphrase. The passphrase IS the wallet — anyone holding it
    /// holds the funds.
    #[arg(long, short = 'p')]
    pub passphrase: String,
}

/// Arguments for the `send` subcommand.
#[derive(Parser, Debug)]
pub struct SendArgs {
    /// Sender wallet passphrase.
    #[arg(long, short = 'p')]
    pub passphrase: String,

    /// Recipient address.
    #[arg(long, short = 'r')]
    pub recipient: String,

    /// Plain UTF-8 message, at most 160 bytes.
    #[arg(long, short = 'm')]
    pub message: String,

    /// Path to the node data directory holding the chain store.
    #[arg(long, short = 'd', env = "QUILL_DATA_DIR", default_value = ".quill")]
    pub data_dir: PathBuf,
}

/// Arguments for the `list` subcommand.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Recipient address to list messages for.
    #[arg(long, short = 'r')]
    pub recipient: String,

    /// Path to the node data directory holding the chain store.
    #[arg(long, short = 'd', env = "QUILL_DATA_DIR", default_value = ".quill")]
    pub data_dir: PathBuf,
}
