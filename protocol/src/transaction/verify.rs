//! Generic transaction verification: structural checks and cryptographic
//! validation.
//!
//! Every transaction entering the pending pool must pass
//! [`verify_transaction`] before its asset handler's own `verify` hook runs.
//! The checks are ordered from cheapest to most expensive (field parsing
//! before hashing before signature verification) to fail fast on garbage.
//!
//! Note the error shape: a *malformed* signature or key is a structured
//! error with a reason, but a well-formed signature that simply doesn't
//! verify surfaces as [`TransactionError::InvalidSignature`] with no further
//! detail — the cryptographic layer reports only a boolean and callers
//! treat every failure uniformly as "reject".

use thiserror::Error;

use super::types::Transaction;
use crate::crypto::{address_from_public_key, verify, QuillPublicKey, QuillSignature};

/// Errors that can occur during generic transaction verification.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// The transaction is not signed.
    #[error("transaction is unsigned")]
    MissingSignature,

    /// The signature field cannot be decoded into 64 raw bytes.
    #[error("malformed signature: {reason}")]
    MalformedSignature { reason: String },

    /// The sender public key is not 32 hex-decodable bytes.
    #[error("malformed sender public key: {value}")]
    MalformedPublicKey { value: String },

    /// The sender public key is not a valid Ed25519 point.
    #[error("invalid sender public key: {value}")]
    InvalidPublicKey { value: String },

    /// The sender address does not belong to the embedded public key.
    #[error("sender address mismatch: claimed {claimed}, key owns {derived}")]
    SenderMismatch { claimed: String, derived: String },

    /// The id does not match the one derived from the signed canonical bytes.
    #[error("transaction id mismatch: expected {expected}, got {actual}")]
    IdMismatch { expected: String, actual: String },

    /// The Ed25519 signature does not verify against the sender's key.
    #[error("invalid signature: does not verify against sender {sender}")]
    InvalidSignature { sender: String },
}

/// Verify a signed transaction's generic (asset-independent) validity.
///
/// `asset_bytes` is the asset handler's `get_bytes` output for this
/// transaction — the dispatcher computes it once and threads it through.
///
/// The checks, in order:
///
/// 1. **Public key** — hex-decodes to 32 bytes and is a valid curve point.
/// 2. **Sender address** — matches the address derived from the public key
///    (prevents key-substitution).
/// 3. **Signature present and well-formed** — 64 raw bytes.
/// 4. **Id integrity** — equals the id derived from the signed canonical
///    bytes.
/// 5. **Signature validity** — detached verification over the signable
///    bytes.
pub fn verify_transaction(
    tx: &Transaction,
    asset_bytes: &[u8],
) -> Result<(), TransactionError> {
    let public_key = QuillPublicKey::from_hex(&tx.sender_public_key).map_err(|_| {
        TransactionError::InvalidPublicKey {
            value: tx.sender_public_key.clone(),
        }
    })?;

    let derived = address_from_public_key(&public_key);
    if derived != tx.sender_id {
        return Err(TransactionError::SenderMismatch {
            claimed: tx.sender_id.clone(),
            derived,
        });
    }

    // Also validates signature presence and shape.
    let expected_id = tx.compute_id(asset_bytes)?;
    if tx.id != expected_id {
        return Err(TransactionError::IdMismatch {
            expected: expected_id,
            actual: tx.id.clone(),
        });
    }

    let sig_hex = tx
        .signature
        .as_ref()
        .ok_or(TransactionError::MissingSignature)?;
    let signature =
        QuillSignature::from_hex(sig_hex).map_err(|e| TransactionError::MalformedSignature {
            reason: e.to_string(),
        })?;

    let signable = tx.signable_bytes(asset_bytes)?;
    if !verify(&public_key, &signable, &signature) {
        return Err(TransactionError::InvalidSignature {
            sender: tx.sender_id.clone(),
        });
    }

    Ok(())
}
