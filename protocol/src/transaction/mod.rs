//! # Transaction Module
//!
//! The transaction data model, its canonical byte encoding, and the generic
//! (asset-agnostic) verification pass.
//!
//! ## Architecture
//!
//! ```text
//! types.rs  — Transaction struct, canonical/signable bytes, id computation
//! verify.rs — Structural and cryptographic verification
//! ```
//!
//! ## Canonical bytes and the id
//!
//! The signable form serializes, in order: type tag, raw sender public key,
//! recipient (presence-flagged), amount, fee, and the asset bytes the
//! asset handler contributes. The signed (canonical) form appends the raw
//! 64-byte signature. The transaction id is derived from the **signed**
//! canonical bytes — the sender-observable final form — so an id exists only
//! once a signature does, and every node derives the same id from the same
//! signed transaction. The id excludes only itself and `block_id`.

pub mod types;
pub mod verify;

pub use types::Transaction;
pub use verify::{verify_transaction, TransactionError};
