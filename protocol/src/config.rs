//! # Protocol Configuration & Constants
//!
//! Every magic number in Quill lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! These values are consensus-critical: two nodes disagreeing on any of them
//! will derive different signatures, different ids, or different balances,
//! and silently fork. Change them only on a coordinated protocol upgrade.

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// The only signature scheme in the protocol. Ed25519 signatures are
/// deterministic (RFC 8032), which is load-bearing here: re-signing the same
/// transaction must reproduce byte-identical signatures on every node.
pub const SIGNING_ALGORITHM: &str = "Ed25519";

/// Ed25519 public key length in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Boundary form of the private key: 32-byte seed followed by the 32-byte
/// public key (the NaCl `crypto_sign` secret-key layout).
pub const PRIVATE_KEY_LENGTH: usize = 64;

/// Ed25519 detached signature length. Always 64 bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// SHA-256 digest length. The single hash primitive of the protocol — key
/// seeds, signing pre-images, and ids all flow through it, so cross-node
/// determinism is trivial to audit.
pub const DIGEST_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Monetary Parameters
// ---------------------------------------------------------------------------

/// Fixed-point scale of the base unit: 1.0 QIL = 10^8 base units.
pub const BASE_UNIT_DECIMALS: u32 = 8;

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Suffix appended to the decimal account number to form an address,
/// e.g. `6845913370427949096Q`.
pub const ADDRESS_SUFFIX: char = 'Q';

/// Longest legal address/recipient string: a 20-digit `u64` plus the suffix.
pub const MAX_ADDRESS_LENGTH: usize = 21;

// ---------------------------------------------------------------------------
// Message Asset (type 6)
// ---------------------------------------------------------------------------

/// Type tag of the message asset on the wire.
pub const MESSAGE_TYPE: u8 = 6;

/// Flat fee for a message transaction: 1.0 QIL regardless of length.
pub const MESSAGE_FEE: u64 = 100_000_000;

/// Maximum decoded message length in bytes.
pub const MAX_MESSAGE_BYTES: usize = 160;

/// Maximum message payload length in hex characters (2 per byte).
pub const MAX_MESSAGE_HEX_CHARS: usize = 2 * MAX_MESSAGE_BYTES;

/// Longest accepted passphrase when constructing a transaction through the
/// query surface. Longer secrets add no security past the SHA-256 seed.
pub const MAX_PASSPHRASE_LENGTH: usize = 100;
