//! # Key Management
//!
//! Passphrase-derived Ed25519 keypairs — the identity primitive of Quill.
//!
//! There is no key file and no RNG in this module. A wallet IS its
//! passphrase: `seed = SHA-256(utf8(passphrase))`, expanded into an Ed25519
//! keypair by the scheme's deterministic key generation. The same passphrase
//! always yields the same keypair, on every machine, forever. That invariant
//! is load-bearing — it is the only way users recover funds — so don't get
//! clever with KDFs, salts, or stretching here. Changing the derivation
//! strands every existing wallet.
//!
//! ## Security considerations
//!
//! - The derivation is only as strong as the passphrase. That's the deal
//!   users sign up for with a brain wallet.
//! - Private key bytes are never logged. If you add logging to this module,
//!   you will be asked to leave.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

use super::hash::sha256_array;
use crate::config::{PRIVATE_KEY_LENGTH, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};

/// Errors that can occur during key operations.
///
/// Intentionally vague about *why* something failed — leaking details about
/// key material through error messages is a classic footgun.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid private key bytes: wrong length or malformed keypair")]
    InvalidPrivateKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,
}

/// A Quill identity keypair wrapping an Ed25519 signing key.
///
/// Derived deterministically from a passphrase via
/// [`QuillKeypair::from_passphrase`]. Immutable once derived.
///
/// ## Serialization
///
/// `QuillKeypair` intentionally does NOT implement `Serialize`/`Deserialize`.
/// Exporting private key material should be a deliberate act — use
/// [`QuillKeypair::private_key_hex`] explicitly, not an accidental
/// `serde_json::to_string` on a struct that happened to contain a keypair.
///
/// # Examples
///
/// ```
/// use quill_protocol::crypto::{QuillKeypair, sign, verify};
///
/// let kp = QuillKeypair::from_passphrase("robust swift grow");
/// let sig = sign(&kp, b"hi");
/// assert!(verify(&kp.public_key(), b"hi", &sig));
/// ```
pub struct QuillKeypair {
    signing_key: SigningKey,
}

/// The public half of a Quill identity, safe to share with the world.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuillPublicKey {
    bytes: [u8; PUBLIC_KEY_LENGTH],
}

/// A detached Ed25519 signature over a message digest.
///
/// 64 bytes, stored separately from the signed payload. Deterministic for a
/// given (key, payload) pair. Stored as `Vec<u8>` for serde compatibility,
/// but always exactly 64 bytes when produced by [`super::signing::sign`].
/// A `QuillSignature` of any other length simply fails verification — no
/// panics, no undefined behavior, just a boolean `false`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuillSignature {
    bytes: Vec<u8>,
}

impl QuillKeypair {
    /// Derive a keypair from a passphrase.
    ///
    /// `seed = SHA-256(utf8(passphrase))`, then Ed25519 key generation from
    /// seed. Pure — no randomness, no I/O — so the same passphrase yields a
    /// byte-identical keypair on every call. Any non-empty UTF-8 string is a
    /// legal passphrase; there is nothing to fail on.
    pub fn from_passphrase(passphrase: &str) -> Self {
        let seed = sha256_array(passphrase.as_bytes());
        Self::from_seed(&seed)
    }

    /// Construct a keypair directly from a 32-byte seed.
    ///
    /// The seed is used as the Ed25519 secret scalar.
    /// [`Self::from_passphrase`] is the normal entry point; this exists for
    /// tests and for callers that manage seed material themselves.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Reconstruct a keypair from its 64-byte boundary form (seed followed
    /// by public key), hex-encoded.
    ///
    /// The embedded public key is checked against the one re-derived from
    /// the seed, so a corrupted or spliced keypair string is rejected.
    pub fn from_private_key_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidPrivateKey)?;
        if bytes.len() != PRIVATE_KEY_LENGTH {
            return Err(KeyError::InvalidPrivateKey);
        }
        let mut arr = [0u8; PRIVATE_KEY_LENGTH];
        arr.copy_from_slice(&bytes);
        let signing_key =
            SigningKey::from_keypair_bytes(&arr).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Returns the public key associated with this keypair.
    pub fn public_key(&self) -> QuillPublicKey {
        QuillPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Raw public key bytes (32 bytes). Safe to share, log, tattoo on your
    /// arm, etc.
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Hex-encoded public key. 64 lowercase characters.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }

    /// The 64-byte boundary form of the private key: seed followed by public
    /// key (the NaCl `crypto_sign` secret-key layout).
    pub fn private_key_bytes(&self) -> [u8; PRIVATE_KEY_LENGTH] {
        self.signing_key.to_keypair_bytes()
    }

    /// Hex-encoded private key (128 lowercase characters).
    ///
    /// **Handle with extreme care.** Anyone holding this string holds the
    /// wallet.
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.private_key_bytes())
    }

    /// Produce a detached signature over `digest` (already-hashed input).
    ///
    /// Callers should go through [`super::signing::sign`], which hashes the
    /// payload first; this low-level entry point exists so the hash-then-sign
    /// construction lives in exactly one place.
    pub(crate) fn sign_digest(&self, digest: &[u8; 32]) -> QuillSignature {
        let sig = self.signing_key.sign(digest);
        QuillSignature {
            bytes: sig.to_bytes().to_vec(),
        }
    }
}

impl Clone for QuillKeypair {
    /// Cloning a keypair is allowed but should make you uncomfortable.
    /// Every copy of a private key is another thing to protect.
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl fmt::Debug for QuillKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret material in debug output. Not even "partially."
        write!(f, "QuillKeypair(pub={})", self.public_key_hex())
    }
}

impl PartialEq for QuillKeypair {
    /// Two keypairs are equal if their public keys match. Comparing secret
    /// material in a non-constant-time way is a bad habit, and for identity
    /// purposes the public key is what matters.
    fn eq(&self, other: &Self) -> bool {
        self.public_key_bytes() == other.public_key_bytes()
    }
}

impl Eq for QuillKeypair {}

// ---------------------------------------------------------------------------
// QuillPublicKey
// ---------------------------------------------------------------------------

impl QuillPublicKey {
    /// Create a `QuillPublicKey` from raw bytes.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Parse a hex-encoded public key and validate it is a real Ed25519
    /// point. Rejects wrong lengths, bad hex, and degenerate curve points.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidPublicKey)?;
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(KeyError::InvalidPublicKey);
        }
        let mut arr = [0u8; PUBLIC_KEY_LENGTH];
        arr.copy_from_slice(&bytes);
        VerifyingKey::from_bytes(&arr).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes: arr })
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.bytes
    }

    /// Hex-encoded representation. 64 characters for 32 bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Verify a detached signature over `digest` against this public key.
    ///
    /// Returns `false` for any failure — malformed key bytes, wrong-length
    /// signature, or a signature that simply doesn't verify. Callers treat
    /// every non-true result uniformly as "reject".
    pub(crate) fn verify_digest(&self, digest: &[u8; 32], signature: &QuillSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let sig_bytes: [u8; SIGNATURE_LENGTH] = match signature.bytes.as_slice().try_into() {
            Ok(b) => b,
            Err(_) => return false,
        };
        let sig = DalekSignature::from_bytes(&sig_bytes);
        verifying_key.verify(digest, &sig).is_ok()
    }
}

impl Hash for QuillPublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Display for QuillPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for QuillPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuillPublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// QuillSignature
// ---------------------------------------------------------------------------

impl QuillSignature {
    /// Create a signature from its raw 64-byte representation.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Returns the raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex-encoded signature string. 128 characters for a valid signature.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Parse a hex-encoded signature. Rejects bad hex and wrong lengths.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        Ok(Self { bytes })
    }
}

impl fmt::Display for QuillSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for QuillSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        if hex_str.len() >= 128 {
            write!(f, "QuillSignature({}...{})", &hex_str[..8], &hex_str[120..])
        } else {
            write!(f, "QuillSignature({})", hex_str)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passphrase_derivation_is_deterministic() {
        let kp1 = QuillKeypair::from_passphrase("robust swift grow");
        let kp2 = QuillKeypair::from_passphrase("robust swift grow");
        assert_eq!(kp1.public_key_bytes(), kp2.public_key_bytes());
        assert_eq!(kp1.private_key_bytes(), kp2.private_key_bytes());
    }

    #[test]
    fn known_passphrase_vector() {
        // Fixed vector: seed = SHA-256("robust swift grow"). This catches
        // regressions in the derivation if the Ed25519 backend is ever
        // swapped — wallets are recoverable only through this exact function.
        let kp = QuillKeypair::from_passphrase("robust swift grow");
        assert_eq!(
            kp.public_key_hex(),
            "5f2369fd36d523cc489ba1fa84cff0949f4dc98d5c28fc2b6179e8e0d9a1cf7a"
        );
        assert!(kp.private_key_hex().starts_with(
            "6358a2348694f801012de9795dbfac44827c969874a6e8749a8b563b0759eda6"
        ));
    }

    #[test]
    fn different_passphrases_different_keys() {
        let kp1 = QuillKeypair::from_passphrase("hello");
        let kp2 = QuillKeypair::from_passphrase("hello ");
        assert_ne!(kp1.public_key_bytes(), kp2.public_key_bytes());
    }

    #[test]
    fn private_key_is_64_bytes_seed_then_public() {
        let kp = QuillKeypair::from_passphrase("hello");
        let bytes = kp.private_key_bytes();
        assert_eq!(bytes.len(), 64);
        assert_eq!(&bytes[32..], kp.public_key_bytes().as_slice());
    }

    #[test]
    fn private_key_hex_roundtrip() {
        let kp = QuillKeypair::from_passphrase("correct horse battery staple");
        let restored = QuillKeypair::from_private_key_hex(&kp.private_key_hex()).unwrap();
        assert_eq!(kp.public_key_bytes(), restored.public_key_bytes());
    }

    #[test]
    fn from_private_key_hex_rejects_garbage() {
        // Too short.
        assert!(QuillKeypair::from_private_key_hex("deadbeef").is_err());
        // Not hex at all.
        assert!(QuillKeypair::from_private_key_hex("not-hex-at-all").is_err());
        // Right length, but the public half doesn't match the seed.
        let kp = QuillKeypair::from_passphrase("hello");
        let mut bytes = kp.private_key_bytes();
        bytes[40] ^= 0xFF;
        assert!(QuillKeypair::from_private_key_hex(&hex::encode(bytes)).is_err());
    }

    #[test]
    fn public_key_hex_roundtrip() {
        let pk = QuillKeypair::from_passphrase("hello").public_key();
        let recovered = QuillPublicKey::from_hex(&pk.to_hex()).unwrap();
        assert_eq!(pk, recovered);
    }

    #[test]
    fn public_key_from_hex_rejects_invalid() {
        // Wrong length.
        assert!(QuillPublicKey::from_hex("deadbeef").is_err());
        // All-zero bytes are not a valid Ed25519 point.
        assert!(QuillPublicKey::from_hex(&"00".repeat(32)).is_err());
    }

    #[test]
    fn signature_hex_roundtrip() {
        let sig = QuillSignature::from_bytes([7u8; 64]);
        let recovered = QuillSignature::from_hex(&sig.to_hex()).unwrap();
        assert_eq!(sig, recovered);
    }

    #[test]
    fn signature_from_hex_rejects_wrong_length() {
        assert!(QuillSignature::from_hex("abcd").is_err());
        assert!(QuillSignature::from_hex(&"ab".repeat(63)).is_err());
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = QuillKeypair::from_passphrase("hello");
        let debug_str = format!("{:?}", kp);
        assert!(debug_str.starts_with("QuillKeypair(pub="));
        assert!(!debug_str.contains(&kp.private_key_hex()));
    }
}
