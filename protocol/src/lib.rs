// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Quill Protocol — Core Library
//!
//! Quill is an account-based message ledger: a blockchain whose flagship
//! transaction kind carries a short message instead of a payment. This crate
//! is the settlement core — the part every node must compute bit-for-bit
//! identically or the network falls apart.
//!
//! Two responsibilities form the hard center:
//!
//! 1. **Cryptographic identity and integrity.** Keypairs are derived
//!    deterministically from a passphrase (brain wallets — the passphrase IS
//!    the wallet), signatures are detached Ed25519 over a SHA-256 digest, and
//!    transaction identifiers are decimal `u64` strings squeezed out of the
//!    same hash. One hash function, one signature scheme, zero ambient
//!    randomness.
//!
//! 2. **The asset-type lifecycle contract.** Every transaction kind plugs
//!    into the generic dispatcher through [`asset::AssetHandler`]: create,
//!    fee, canonical bytes, verify, apply/undo against the confirmed ledger,
//!    apply/undo against the tentative (pending-pool) ledger, persistence
//!    mapping, and schema normalization. The dual-ledger semantics are what
//!    make block reorganizations safe.
//!
//! ## Architecture
//!
//! - **crypto** — SHA-256, passphrase-derived Ed25519 keypairs, detached
//!   sign/verify, and the numeric id derivation. The compatibility-critical
//!   floor of the protocol.
//! - **ledger** — Accounts with confirmed (`balance`) and tentative
//!   (`u_balance`) funds, mutated only through signed deltas.
//! - **transaction** — The transaction data model and its canonical byte
//!   encoding for signing and id derivation.
//! - **asset** — The [`asset::AssetHandler`] lifecycle contract, the type-tag
//!   registry, and the message asset (type 6).
//! - **dispatcher** — The pending pool and the hook-ordering state machine:
//!   `{unapplied} → {pool-pending} → {confirmed}` and back.
//! - **storage** — sled-backed persistence for transaction rows and
//!   per-asset tables.
//! - **config** — Protocol constants. Change these and you have a fork.
//!
//! ## Design Philosophy
//!
//! 1. Determinism above everything — every node derives the same bytes.
//! 2. Crypto verification failures are `false`, never panics or errors.
//! 3. Balance mutations come in exact apply/undo pairs. No orphan debits.
//! 4. If it touches money, it has tests. Plural.

pub mod asset;
pub mod config;
pub mod crypto;
pub mod dispatcher;
pub mod ledger;
pub mod storage;
pub mod transaction;
