//! # Numeric Id Derivation
//!
//! Turns arbitrary bytes into the decimal-string identifiers used for
//! transactions and accounts. This is the single most compatibility-sensitive
//! algorithm in the protocol: every implementation must reproduce it
//! bit-for-bit or nodes disagree on transaction ids and the network
//! partitions.
//!
//! The algorithm: `h = SHA-256(payload)`; take the LAST 8 bytes of `h`,
//! reverse their byte order, read them as an unsigned big-endian 64-bit
//! integer, render base-10. The byte reversal mirrors the little-endian
//! integer representation of the consensus engine's native layout.
//!
//! Id collisions between distinct payloads are cryptographically negligible
//! and are not specially handled anywhere.

use super::hash::sha256_array;
use super::keys::QuillPublicKey;
use crate::config::ADDRESS_SUFFIX;

/// Derive the canonical decimal id of a byte payload.
///
/// Pure function: equal byte sequences always produce equal ids, and the
/// result always fits an unsigned 64-bit integer. Zero renders as `"0"`;
/// there are never leading zeros.
///
/// # Example
///
/// ```
/// use quill_protocol::crypto::derive_id;
///
/// assert_eq!(derive_id(b"hi"), "11851841292845288392");
/// ```
pub fn derive_id(payload: &[u8]) -> String {
    let digest = sha256_array(payload);
    // Last 8 digest bytes, reversed, read big-endian.
    let mut tail = [0u8; 8];
    for (i, byte) in tail.iter_mut().enumerate() {
        *byte = digest[31 - i];
    }
    u64::from_be_bytes(tail).to_string()
}

/// Derive the account address owned by a public key.
///
/// The address is the numeric id of the raw public key bytes with the
/// network suffix appended, e.g. `6845913370427949096Q`. At most 21
/// characters (20 decimal digits plus the suffix).
pub fn address_from_public_key(public_key: &QuillPublicKey) -> String {
    format!("{}{}", derive_id(public_key.as_bytes()), ADDRESS_SUFFIX)
}
