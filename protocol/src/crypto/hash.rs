//! # Hashing
//!
//! SHA-256, and nothing else. The protocol uses a single 256-bit hash for key
//! derivation, signing pre-images, and id derivation — one primitive to
//! audit, one set of test vectors, no "which hash was this again?" moments
//! when debugging a cross-node id mismatch at 3am.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data.
///
/// Returns a 32-byte digest as a `Vec<u8>`. Pure and stateless.
///
/// Why `Vec<u8>` and not `[u8; 32]`? Because half the callers immediately
/// pass it to functions that want `&[u8]`. The heap allocation is noise
/// compared to the cost of the hash itself.
///
/// # Example
///
/// ```
/// use quill_protocol::crypto::sha256;
///
/// let digest = sha256(b"quill protocol");
/// assert_eq!(digest.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Compute the SHA-256 hash and return a fixed-size array.
///
/// Same as [`sha256`] but returns `[u8; 32]` for callers that want a
/// fixed-size type without the heap allocation. This is the form used on the
/// hot paths: seed expansion, signing pre-images, and id derivation.
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}
