//! # Detached Signing
//!
//! The hash-then-sign construction used for every transaction in Quill.
//!
//! The scheme signs `SHA-256(payload)`, not the raw payload. Payload length
//! therefore has no bearing on signing cost, and — more importantly — every
//! implementation that wants to agree on signature bytes only has to agree
//! on the digest. Ed25519 signing is itself deterministic (RFC 8032), so the
//! same key and payload always produce byte-identical signatures; validation
//! stays reproducible across re-derivation on any node.
//!
//! Verification failures are a boolean `false`, never an error or a panic.
//! Malformed keys, truncated signatures, zero bytes — all uniformly "nope".
//! Giving callers (or attackers) a detailed failure oracle buys nothing.

use super::hash::sha256_array;
use super::keys::{QuillKeypair, QuillPublicKey, QuillSignature};

/// Sign a payload with a Quill keypair.
///
/// Computes `SHA-256(payload)` and produces a detached Ed25519 signature
/// over the digest. Deterministic: same key + same payload = same 64 bytes.
///
/// # Example
///
/// ```
/// use quill_protocol::crypto::{QuillKeypair, sign, verify};
///
/// let kp = QuillKeypair::from_passphrase("robust swift grow");
/// let sig = sign(&kp, b"send 1 QIL to alice");
/// assert!(verify(&kp.public_key(), b"send 1 QIL to alice", &sig));
/// ```
pub fn sign(keypair: &QuillKeypair, payload: &[u8]) -> QuillSignature {
    let digest = sha256_array(payload);
    keypair.sign_digest(&digest)
}

/// Verify a detached signature over a payload.
///
/// Recomputes `SHA-256(payload)` and checks the signature against the
/// public key. Returns `true` only for a valid signature; every failure
/// mode — wrong payload, wrong key, malformed signature bytes — is `false`.
pub fn verify(public_key: &QuillPublicKey, payload: &[u8], signature: &QuillSignature) -> bool {
    let digest = sha256_array(payload);
    public_key.verify_digest(&digest, signature)
}

/// Verify using hex-encoded key and signature.
///
/// This is the "I got these strings off the wire and need to check them"
/// variant. Any malformed input — bad hex, wrong lengths, degenerate curve
/// points — yields `false` without error, matching the constant-behavior
/// contract callers rely on.
pub fn verify_hex(public_key_hex: &str, signature_hex: &str, payload: &[u8]) -> bool {
    let Ok(public_key) = QuillPublicKey::from_hex(public_key_hex) else {
        return false;
    };
    let Ok(signature) = QuillSignature::from_hex(signature_hex) else {
        return false;
    };
    verify(&public_key, payload, &signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_roundtrip() {
        let kp = QuillKeypair::from_passphrase("robust swift grow");
        let sig = sign(&kp, b"hello, world");
        assert!(verify(&kp.public_key(), b"hello, world", &sig));
    }

    #[test]
    fn wrong_payload_fails() {
        let kp = QuillKeypair::from_passphrase("robust swift grow");
        let sig = sign(&kp, b"correct message");
        assert!(!verify(&kp.public_key(), b"wrong message", &sig));
    }

    #[test]
    fn wrong_key_fails() {
        let kp1 = QuillKeypair::from_passphrase("alpha");
        let kp2 = QuillKeypair::from_passphrase("beta");
        let sig = sign(&kp1, b"message");
        assert!(!verify(&kp2.public_key(), b"message", &sig));
    }

    #[test]
    fn signing_is_deterministic() {
        let kp = QuillKeypair::from_passphrase("determinism is underrated");
        let sig1 = sign(&kp, b"payload");
        let sig2 = sign(&kp, b"payload");
        assert_eq!(sig1.as_bytes(), sig2.as_bytes());
    }

    #[test]
    fn known_signature_vector() {
        // Fixed vector: passphrase "robust swift grow" signing the payload
        // "hi". Hash-then-sign must reproduce these exact 64 bytes on every
        // node, or transaction ids diverge across implementations.
        let kp = QuillKeypair::from_passphrase("robust swift grow");
        let sig = sign(&kp, b"hi");
        assert_eq!(
            sig.to_hex(),
            "d0c4bfdeb00a1f00ab21e91216766ef15b7672a1d0f35c2b21180728fe932e3d\
             9a0a4f0ced8c4e49f5228506f5348dac02e53491b1761ca850dbd6250d7e6e01"
        );
    }

    #[test]
    fn empty_payload_is_signable() {
        let kp = QuillKeypair::from_passphrase("hello");
        let sig = sign(&kp, b"");
        assert!(verify(&kp.public_key(), b"", &sig));
    }

    #[test]
    fn large_payload_is_signable() {
        // The scheme signs the digest, so payload size is irrelevant.
        let kp = QuillKeypair::from_passphrase("hello");
        let payload = vec![0xAB; 1_000_000];
        let sig = sign(&kp, &payload);
        assert!(verify(&kp.public_key(), &payload, &sig));
    }

    #[test]
    fn verify_hex_accepts_valid_input() {
        let kp = QuillKeypair::from_passphrase("robust swift grow");
        let sig = sign(&kp, b"payload");
        assert!(verify_hex(&kp.public_key_hex(), &sig.to_hex(), b"payload"));
    }

    #[test]
    fn verify_hex_never_errors_on_malformed_input() {
        let kp = QuillKeypair::from_passphrase("hello");
        let pk_hex = kp.public_key_hex();
        let sig = sign(&kp, b"payload");

        // Truncated signature.
        assert!(!verify_hex(&pk_hex, &sig.to_hex()[..120], b"payload"));
        // Zero signature.
        assert!(!verify_hex(&pk_hex, &"00".repeat(64), b"payload"));
        // Odd-length hex.
        assert!(!verify_hex(&pk_hex, "abc", b"payload"));
        // Truncated public key.
        assert!(!verify_hex(&pk_hex[..30], &sig.to_hex(), b"payload"));
        // Zero public key (a degenerate curve point).
        assert!(!verify_hex(&"00".repeat(32), &sig.to_hex(), b"payload"));
        // Not hex at all.
        assert!(!verify_hex("not hex", "also not hex", b"payload"));
    }
}
