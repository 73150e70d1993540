//! Core transaction type and its canonical byte encoding.

use serde::{Deserialize, Serialize};

use super::verify::TransactionError;
use crate::config::{PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use crate::crypto::derive_id;
use crate::storage::TransactionRecord;

/// A Quill transaction.
///
/// The `asset` field is the asset-specific payload as free-form JSON; its
/// shape is owned by the asset handler registered for `tx_type`, which also
/// contributes the payload's canonical bytes via `get_bytes`. A transaction
/// exclusively owns its asset payload.
///
/// Wire field names are camelCase (`senderId`, `senderPublicKey`, …) and the
/// type tag travels as `type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Decimal u64 id derived from the signed canonical bytes. Empty until
    /// the transaction is signed and id-stamped.
    pub id: String,

    /// Asset kind tag (the message asset is type 6).
    #[serde(rename = "type")]
    pub tx_type: u8,

    /// Sender's ledger address.
    pub sender_id: String,

    /// Hex-encoded sender public key; embedded so validators can verify the
    /// signature without a separate key lookup.
    pub sender_public_key: String,

    /// Recipient address, for asset kinds that have one.
    pub recipient_id: Option<String>,

    /// Transferred amount in base units. Zero for non-monetary assets.
    pub amount: u64,

    /// Fee in base units, fixed by the asset handler at construction.
    pub fee: u64,

    /// Hex-encoded detached Ed25519 signature (128 hex chars once signed).
    pub signature: Option<String>,

    /// Asset-specific payload. Shape is owned by the handler for `tx_type`.
    #[serde(default)]
    pub asset: serde_json::Value,

    /// Id of the containing block, once confirmed.
    pub block_id: Option<String>,
}

impl Transaction {
    /// An unsigned, asset-less skeleton for the dispatcher to populate.
    pub fn skeleton(
        tx_type: u8,
        sender_id: impl Into<String>,
        sender_public_key: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            tx_type,
            sender_id: sender_id.into(),
            sender_public_key: sender_public_key.into(),
            recipient_id: None,
            amount: 0,
            fee: 0,
            signature: None,
            asset: serde_json::Value::Null,
            block_id: None,
        }
    }

    /// The canonical unsigned byte form — the signing pre-image.
    ///
    /// Order-sensitive concatenation: type tag (1 byte), raw sender public
    /// key (32 bytes), recipient with a presence flag and NUL terminator,
    /// amount (LE u64), fee (LE u64), then the asset bytes contributed by
    /// the handler. Excluded: `id`, `signature`, `block_id`.
    pub fn signable_bytes(&self, asset_bytes: &[u8]) -> Result<Vec<u8>, TransactionError> {
        let mut buf = Vec::with_capacity(64 + asset_bytes.len());

        buf.push(self.tx_type);

        let public_key =
            hex::decode(&self.sender_public_key).map_err(|_| TransactionError::MalformedPublicKey {
                value: self.sender_public_key.clone(),
            })?;
        if public_key.len() != PUBLIC_KEY_LENGTH {
            return Err(TransactionError::MalformedPublicKey {
                value: self.sender_public_key.clone(),
            });
        }
        buf.extend_from_slice(&public_key);

        // Presence flag keeps `None` distinguishable from an empty string.
        match &self.recipient_id {
            Some(recipient) => {
                buf.push(0x01);
                buf.extend_from_slice(recipient.as_bytes());
                buf.push(0x00);
            }
            None => buf.push(0x00),
        }

        buf.extend_from_slice(&self.amount.to_le_bytes());
        buf.extend_from_slice(&self.fee.to_le_bytes());
        buf.extend_from_slice(asset_bytes);

        Ok(buf)
    }

    /// The canonical signed byte form: [`signable_bytes`](Self::signable_bytes)
    /// with the raw 64-byte signature appended. Errors if the transaction is
    /// unsigned or the signature field is malformed.
    pub fn canonical_bytes(&self, asset_bytes: &[u8]) -> Result<Vec<u8>, TransactionError> {
        let mut buf = self.signable_bytes(asset_bytes)?;

        let sig_hex = self
            .signature
            .as_ref()
            .ok_or(TransactionError::MissingSignature)?;
        let sig = hex::decode(sig_hex).map_err(|e| TransactionError::MalformedSignature {
            reason: format!("hex decode failed: {e}"),
        })?;
        if sig.len() != SIGNATURE_LENGTH {
            return Err(TransactionError::MalformedSignature {
                reason: format!("expected {} bytes, got {}", SIGNATURE_LENGTH, sig.len()),
            });
        }
        buf.extend_from_slice(&sig);

        Ok(buf)
    }

    /// Compute the transaction id from the signed canonical bytes.
    pub fn compute_id(&self, asset_bytes: &[u8]) -> Result<String, TransactionError> {
        Ok(derive_id(&self.canonical_bytes(asset_bytes)?))
    }

    /// Returns `true` if the transaction carries a signature.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// The generic persisted columns of this transaction (asset excluded —
    /// asset payloads persist in their own table).
    pub fn to_record(&self) -> TransactionRecord {
        TransactionRecord {
            id: self.id.clone(),
            tx_type: self.tx_type,
            sender_id: self.sender_id.clone(),
            sender_public_key: self.sender_public_key.clone(),
            recipient_id: self.recipient_id.clone(),
            amount: self.amount,
            fee: self.fee,
            signature: self.signature.clone(),
            block_id: self.block_id.clone(),
        }
    }

    /// Rebuild a transaction from its persisted columns and a decoded asset
    /// payload.
    pub fn from_record(record: TransactionRecord, asset: serde_json::Value) -> Self {
        Self {
            id: record.id,
            tx_type: record.tx_type,
            sender_id: record.sender_id,
            sender_public_key: record.sender_public_key,
            recipient_id: record.recipient_id,
            amount: record.amount,
            fee: record.fee,
            signature: record.signature,
            asset,
            block_id: record.block_id,
        }
    }
}
