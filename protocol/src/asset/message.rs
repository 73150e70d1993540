//! # Message Asset (type 6)
//!
//! The flagship transaction kind: carry a short message on-chain. The
//! message itself moves no money — the only ledger effect is the flat fee
//! debited from the sender.
//!
//! At rest and on the wire the payload is a lowercase hex string of the
//! UTF-8 message, at most 320 hex characters (160 decoded bytes). It is
//! created at construction time, immutable thereafter, persisted in the
//! `asset_messages` table keyed by transaction id, and removed only
//! alongside its owning transaction.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{AssetError, AssetHandler};
use crate::config::{
    MAX_ADDRESS_LENGTH, MAX_MESSAGE_BYTES, MAX_MESSAGE_HEX_CHARS, MAX_PASSPHRASE_LENGTH,
    MESSAGE_FEE, MESSAGE_TYPE,
};
use crate::crypto::QuillKeypair;
use crate::dispatcher::{DispatchError, Dispatcher};
use crate::ledger::{Account, AccountDelta, AccountRef, LedgerAccountGateway};
use crate::storage::{ChainStore, StorageError, TransactionRow};
use crate::transaction::Transaction;

/// Storage table holding one row per message transaction:
/// `{ transactionId, message (hex) }`.
pub const MESSAGE_TABLE: &str = "asset_messages";

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Caller-facing request for the `add` operation: construct, sign, and
/// submit a message transaction from a passphrase.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMessageRequest {
    /// Recipient address, 1–21 characters.
    pub recipient_id: String,
    /// Wallet passphrase, 1–100 characters. Never persisted, never logged.
    pub passphrase: String,
    /// Plain UTF-8 message, 1–160 bytes.
    pub message: String,
}

impl AddMessageRequest {
    fn validate(&self) -> Result<(), AssetError> {
        if self.recipient_id.is_empty() || self.recipient_id.len() > MAX_ADDRESS_LENGTH {
            return Err(AssetError::Validation {
                reason: format!(
                    "recipientId must be 1..={MAX_ADDRESS_LENGTH} characters"
                ),
            });
        }
        if self.passphrase.is_empty() || self.passphrase.len() > MAX_PASSPHRASE_LENGTH {
            return Err(AssetError::Validation {
                reason: format!("passphrase must be 1..={MAX_PASSPHRASE_LENGTH} characters"),
            });
        }
        if self.message.is_empty() || self.message.len() > MAX_MESSAGE_BYTES {
            return Err(AssetError::Validation {
                reason: format!("message must be 1..={MAX_MESSAGE_BYTES} bytes"),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MessageHandler
// ---------------------------------------------------------------------------

/// [`AssetHandler`] implementation for the message asset.
pub struct MessageHandler {
    ledger: Arc<dyn LedgerAccountGateway>,
    store: Arc<dyn ChainStore>,
}

impl MessageHandler {
    pub fn new(ledger: Arc<dyn LedgerAccountGateway>, store: Arc<dyn ChainStore>) -> Self {
        Self { ledger, store }
    }

    /// The hex payload string, or a validation error if the asset shape is
    /// wrong.
    fn message_hex(tx: &Transaction) -> Result<&str, AssetError> {
        tx.asset
            .get("message")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AssetError::Validation {
                reason: "asset has no message field".to_string(),
            })
    }

    /// Signed ledger-delta amount for this transaction's fee.
    fn fee_delta(tx: &Transaction) -> Result<i64, AssetError> {
        i64::try_from(tx.fee).map_err(|_| AssetError::Validation {
            reason: format!("fee {} exceeds the ledger delta range", tx.fee),
        })
    }

    /// Construct, sign, and submit a new message transaction.
    ///
    /// Derives the keypair from the passphrase, builds the transaction
    /// through the dispatcher, and hands it to the pending pool. Returns
    /// the pool-admitted transaction.
    pub async fn add(
        &self,
        dispatcher: &Dispatcher,
        request: AddMessageRequest,
    ) -> Result<Transaction, DispatchError> {
        request.validate()?;

        let keypair = QuillKeypair::from_passphrase(&request.passphrase);
        let create_request = json!({
            "recipientId": request.recipient_id,
            "message": request.message,
        });

        let tx = dispatcher
            .create_transaction(MESSAGE_TYPE, &keypair, &create_request)
            .await?;
        dispatcher.process_unconfirmed(tx).await
    }

    /// List persisted message transactions addressed to a recipient, with
    /// payloads decoded back to UTF-8 for display.
    pub async fn list(&self, recipient_id: &str) -> Result<Vec<Transaction>, AssetError> {
        if recipient_id.len() < 2 || recipient_id.len() > MAX_ADDRESS_LENGTH {
            return Err(AssetError::Validation {
                reason: format!("recipientId must be 2..={MAX_ADDRESS_LENGTH} characters"),
            });
        }

        let rows = self
            .store
            .transactions_by_recipient(recipient_id, MESSAGE_TYPE, MESSAGE_TABLE)
            .await?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            // Outer-join miss: the transaction carries no message asset.
            let Some(payload) = self.db_read(&row) else {
                tracing::debug!(id = %row.record.id, "message transaction without asset row");
                continue;
            };
            let hex_payload = payload["message"].as_str().unwrap_or_default().to_string();
            let bytes = hex::decode(&hex_payload).map_err(|e| StorageError::Corrupt {
                reason: format!("message payload for {}: {e}", row.record.id),
            })?;
            let text = String::from_utf8(bytes).map_err(|e| StorageError::Corrupt {
                reason: format!("message payload for {}: {e}", row.record.id),
            })?;
            messages.push(Transaction::from_record(
                row.record,
                json!({ "message": text }),
            ));
        }
        Ok(messages)
    }
}

#[async_trait]
impl AssetHandler for MessageHandler {
    fn type_tag(&self) -> u8 {
        MESSAGE_TYPE
    }

    /// Copies the recipient and stores the UTF-8 message as lowercase hex.
    fn create(
        &self,
        request: &serde_json::Value,
        tx: &mut Transaction,
    ) -> Result<(), AssetError> {
        let recipient = request
            .get("recipientId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AssetError::Validation {
                reason: "request has no recipientId".to_string(),
            })?;
        let message = request
            .get("message")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AssetError::Validation {
                reason: "request has no message".to_string(),
            })?;

        tx.recipient_id = Some(recipient.to_string());
        tx.asset = json!({ "message": hex::encode(message.as_bytes()) });
        Ok(())
    }

    /// Flat fee, independent of message length.
    fn calculate_fee(&self, _tx: &Transaction) -> u64 {
        MESSAGE_FEE
    }

    /// The raw bytes decoded from the stored hex payload.
    fn get_bytes(&self, tx: &Transaction) -> Result<Vec<u8>, AssetError> {
        let hex_payload = Self::message_hex(tx)?;
        hex::decode(hex_payload).map_err(|_| AssetError::Validation {
            reason: "message payload is not valid hex".to_string(),
        })
    }

    /// Schema check on externally supplied asset data: an object with a
    /// non-empty hex-formatted `message` string.
    async fn normalize(&self, asset: &serde_json::Value) -> Result<(), AssetError> {
        let message = asset
            .get("message")
            .ok_or_else(|| AssetError::Validation {
                reason: "asset has no message field".to_string(),
            })?
            .as_str()
            .ok_or_else(|| AssetError::Validation {
                reason: "message must be a string".to_string(),
            })?;
        if message.is_empty() {
            return Err(AssetError::Validation {
                reason: "message must not be empty".to_string(),
            });
        }
        if hex::decode(message).is_err() {
            return Err(AssetError::Validation {
                reason: "message must be a hex string".to_string(),
            });
        }
        Ok(())
    }

    /// Fails with a length-limit error when the decoded message exceeds
    /// 160 bytes; otherwise succeeds.
    async fn verify(&self, tx: &Transaction, _sender: &Account) -> Result<(), AssetError> {
        let bytes = self.get_bytes(tx)?;
        if bytes.len() > MAX_MESSAGE_BYTES {
            return Err(AssetError::Validation {
                reason: format!(
                    "message is {} bytes; maximum is {MAX_MESSAGE_BYTES} bytes \
                     ({MAX_MESSAGE_HEX_CHARS} hex characters)",
                    bytes.len()
                ),
            });
        }
        Ok(())
    }

    async fn apply(&self, tx: &Transaction, sender: &Account) -> Result<(), AssetError> {
        let fee = Self::fee_delta(tx)?;
        self.ledger
            .merge_account_and_get(AccountDelta::balance(
                AccountRef::Address(sender.address.clone()),
                -fee,
            ))
            .await?;
        Ok(())
    }

    async fn undo(&self, tx: &Transaction, sender: &Account) -> Result<(), AssetError> {
        let fee = Self::fee_delta(tx)?;
        self.ledger
            .undo_merging(AccountDelta::balance(
                AccountRef::Address(sender.address.clone()),
                -fee,
            ))
            .await?;
        Ok(())
    }

    async fn apply_unconfirmed(
        &self,
        tx: &Transaction,
        sender: &Account,
    ) -> Result<(), AssetError> {
        if sender.u_balance < tx.fee {
            return Err(AssetError::InsufficientFunds {
                available: sender.u_balance,
                required: tx.fee,
            });
        }
        let fee = Self::fee_delta(tx)?;
        self.ledger
            .merge_account_and_get(AccountDelta::unconfirmed(
                AccountRef::Address(sender.address.clone()),
                -fee,
            ))
            .await?;
        Ok(())
    }

    async fn undo_unconfirmed(
        &self,
        tx: &Transaction,
        sender: &Account,
    ) -> Result<(), AssetError> {
        let fee = Self::fee_delta(tx)?;
        self.ledger
            .undo_merging(AccountDelta::unconfirmed(
                AccountRef::Address(sender.address.clone()),
                -fee,
            ))
            .await?;
        Ok(())
    }

    async fn save(&self, tx: &Transaction) -> Result<(), AssetError> {
        let hex_payload = Self::message_hex(tx)?;
        self.store
            .put_asset_row(MESSAGE_TABLE, &tx.id, hex_payload)
            .await?;
        Ok(())
    }

    async fn remove(&self, tx: &Transaction) -> Result<(), AssetError> {
        self.store.delete_asset_row(MESSAGE_TABLE, &tx.id).await?;
        Ok(())
    }

    fn db_read(&self, row: &TransactionRow) -> Option<serde_json::Value> {
        row.asset.as_ref().map(|m| json!({ "message": m }))
    }
}
