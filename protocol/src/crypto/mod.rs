//! # Cryptographic Primitives for Quill
//!
//! Everything security-related flows through this module: passphrase-derived
//! keypairs, detached signatures, and the numeric id derivation.
//!
//! We deliberately chose boring, well-audited cryptography:
//!
//! - **Ed25519** for signatures — deterministic, compact, nobody has broken it.
//! - **SHA-256** for hashing — the one and only hash primitive in the
//!   protocol. Key seeds, signing pre-images, and ids all use it, which keeps
//!   cross-node determinism auditable with a single grep.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. Everything here is a thin, type-safe wrapper around audited
//! implementations. If you're tempted to optimize these functions, please
//! reconsider. Then reconsider again.

pub mod hash;
pub mod id;
pub mod keys;
pub mod signing;

// Re-export the things people actually need so they don't have to memorize
// our module hierarchy.
pub use hash::{sha256, sha256_array};
pub use id::{address_from_public_key, derive_id};
pub use keys::{QuillKeypair, QuillPublicKey, QuillSignature};
pub use signing::{sign, verify, verify_hex};
