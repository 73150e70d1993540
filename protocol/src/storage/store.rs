//! # Chain Store — Persistent Transaction Storage
//!
//! sled-backed persistence, organized the way the relational original laid
//! out its tables:
//!
//! | Tree                | Key                  | Value                          |
//! |---------------------|----------------------|--------------------------------|
//! | `transactions`      | tx id (UTF-8)        | `bincode(TransactionRecord)`   |
//! | `<asset table>`     | tx id (UTF-8)        | asset column value (UTF-8)     |
//!
//! Each asset kind owns one tree named after its table (the message asset
//! uses `asset_messages`). Asset rows are keyed by the owning transaction id
//! and are written and removed only alongside that transaction — never
//! independently.
//!
//! Storage failures are propagated verbatim; this layer does not interpret
//! or retry them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// A persisted row failed to decode on the way out. Indicates on-disk
    /// corruption or a write from an incompatible build.
    #[error("corrupt row: {reason}")]
    Corrupt { reason: String },
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// The generic (asset-agnostic) columns of a persisted transaction.
///
/// Deliberately a separate type from `transaction::Transaction`: the live
/// transaction carries a free-form JSON asset payload, which has no stable
/// bincode encoding. The record holds only concrete columns; the asset
/// payload lives in its own table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub tx_type: u8,
    pub sender_id: String,
    pub sender_public_key: String,
    pub recipient_id: Option<String>,
    pub amount: u64,
    pub fee: u64,
    pub signature: Option<String>,
    pub block_id: Option<String>,
}

/// A transaction record joined with one asset table.
///
/// `asset` is `None` when the outer join missed — the transaction has no
/// row in the asset table being queried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRow {
    pub record: TransactionRecord,
    pub asset: Option<String>,
}

// ---------------------------------------------------------------------------
// ChainStore
// ---------------------------------------------------------------------------

/// Row-level access to persisted transactions and asset tables.
///
/// Callers supply table names and consume rows; key layout, encoding, and
/// the join are implementation details.
#[async_trait]
pub trait ChainStore: Send + Sync {
    /// Insert (or overwrite) a transaction record.
    async fn put_transaction(&self, record: &TransactionRecord) -> Result<(), StorageError>;

    /// Fetch a transaction record by id.
    async fn get_transaction(&self, id: &str) -> Result<Option<TransactionRecord>, StorageError>;

    /// Remove a transaction record. Removing an absent id is a no-op.
    async fn delete_transaction(&self, id: &str) -> Result<(), StorageError>;

    /// Insert (or overwrite) one asset row keyed by transaction id.
    async fn put_asset_row(
        &self,
        table: &str,
        transaction_id: &str,
        value: &str,
    ) -> Result<(), StorageError>;

    /// Fetch one asset row by transaction id.
    async fn get_asset_row(
        &self,
        table: &str,
        transaction_id: &str,
    ) -> Result<Option<String>, StorageError>;

    /// Remove one asset row. Removing an absent row is a no-op.
    async fn delete_asset_row(&self, table: &str, transaction_id: &str)
        -> Result<(), StorageError>;

    /// Select all transactions of `tx_type` addressed to `recipient_id`,
    /// left-outer-joined with `asset_table`.
    async fn transactions_by_recipient(
        &self,
        recipient_id: &str,
        tx_type: u8,
        asset_table: &str,
    ) -> Result<Vec<TransactionRow>, StorageError>;
}

// ---------------------------------------------------------------------------
// SledStore
// ---------------------------------------------------------------------------

/// Name of the generic transaction tree.
const TRANSACTIONS_TREE: &str = "transactions";

/// sled-backed [`ChainStore`].
///
/// sled is inherently thread-safe — all trees support lock-free concurrent
/// reads and serialized writes — so a `SledStore` can be shared across
/// tasks via `Arc` without external synchronization.
#[derive(Debug, Clone)]
pub struct SledStore {
    db: Db,
}

impl SledStore {
    /// Open or create a store at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Create a temporary store that lives in memory and is cleaned up on
    /// drop. Ideal for tests — no filesystem side effects.
    pub fn open_temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    fn tree(&self, name: &str) -> Result<sled::Tree, StorageError> {
        Ok(self.db.open_tree(name)?)
    }
}

fn encode_record(record: &TransactionRecord) -> Result<Vec<u8>, StorageError> {
    bincode::serialize(record).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode_record(bytes: &[u8]) -> Result<TransactionRecord, StorageError> {
    bincode::deserialize(bytes).map_err(|e| StorageError::Corrupt {
        reason: format!("transaction record: {e}"),
    })
}

#[async_trait]
impl ChainStore for SledStore {
    async fn put_transaction(&self, record: &TransactionRecord) -> Result<(), StorageError> {
        let tree = self.tree(TRANSACTIONS_TREE)?;
        tree.insert(record.id.as_bytes(), encode_record(record)?)?;
        Ok(())
    }

    async fn get_transaction(&self, id: &str) -> Result<Option<TransactionRecord>, StorageError> {
        let tree = self.tree(TRANSACTIONS_TREE)?;
        match tree.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(decode_record(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn delete_transaction(&self, id: &str) -> Result<(), StorageError> {
        let tree = self.tree(TRANSACTIONS_TREE)?;
        tree.remove(id.as_bytes())?;
        Ok(())
    }

    async fn put_asset_row(
        &self,
        table: &str,
        transaction_id: &str,
        value: &str,
    ) -> Result<(), StorageError> {
        let tree = self.tree(table)?;
        tree.insert(transaction_id.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    async fn get_asset_row(
        &self,
        table: &str,
        transaction_id: &str,
    ) -> Result<Option<String>, StorageError> {
        let tree = self.tree(table)?;
        match tree.get(transaction_id.as_bytes())? {
            Some(bytes) => {
                let value =
                    String::from_utf8(bytes.to_vec()).map_err(|e| StorageError::Corrupt {
                        reason: format!("asset row in {table}: {e}"),
                    })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn delete_asset_row(
        &self,
        table: &str,
        transaction_id: &str,
    ) -> Result<(), StorageError> {
        let tree = self.tree(table)?;
        tree.remove(transaction_id.as_bytes())?;
        Ok(())
    }

    async fn transactions_by_recipient(
        &self,
        recipient_id: &str,
        tx_type: u8,
        asset_table: &str,
    ) -> Result<Vec<TransactionRow>, StorageError> {
        let transactions = self.tree(TRANSACTIONS_TREE)?;
        let assets = self.tree(asset_table)?;

        // Full scan over the transaction tree. Fine at message-ledger scale;
        // a secondary recipient index slots in here if it ever isn't.
        let mut rows = Vec::new();
        for entry in transactions.iter() {
            let (_, bytes) = entry?;
            let record = decode_record(&bytes)?;
            if record.tx_type != tx_type || record.recipient_id.as_deref() != Some(recipient_id) {
                continue;
            }
            let asset = match assets.get(record.id.as_bytes())? {
                Some(value) => {
                    Some(
                        String::from_utf8(value.to_vec()).map_err(|e| StorageError::Corrupt {
                            reason: format!("asset row in {asset_table}: {e}"),
                        })?,
                    )
                }
                None => None,
            };
            rows.push(TransactionRow { record, asset });
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, recipient: &str) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            tx_type: 6,
            sender_id: "1Q".to_string(),
            sender_public_key: "aa".repeat(32),
            recipient_id: Some(recipient.to_string()),
            amount: 0,
            fee: 100_000_000,
            signature: Some("bb".repeat(64)),
            block_id: Some("99".to_string()),
        }
    }

    #[tokio::test]
    async fn transaction_roundtrip() {
        let store = SledStore::open_temporary().unwrap();
        let rec = record("111", "2Q");

        store.put_transaction(&rec).await.unwrap();
        let loaded = store.get_transaction("111").await.unwrap();
        assert_eq!(loaded, Some(rec));
    }

    #[tokio::test]
    async fn get_missing_transaction_returns_none() {
        let store = SledStore::open_temporary().unwrap();
        assert!(store.get_transaction("404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_transaction_removes_row() {
        let store = SledStore::open_temporary().unwrap();
        store.put_transaction(&record("111", "2Q")).await.unwrap();
        store.delete_transaction("111").await.unwrap();
        assert!(store.get_transaction("111").await.unwrap().is_none());
        // Deleting again is a no-op, not an error.
        store.delete_transaction("111").await.unwrap();
    }

    #[tokio::test]
    async fn asset_row_roundtrip() {
        let store = SledStore::open_temporary().unwrap();
        store
            .put_asset_row("asset_messages", "111", "6869")
            .await
            .unwrap();
        let value = store.get_asset_row("asset_messages", "111").await.unwrap();
        assert_eq!(value.as_deref(), Some("6869"));

        store.delete_asset_row("asset_messages", "111").await.unwrap();
        assert!(store
            .get_asset_row("asset_messages", "111")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn recipient_query_joins_asset_rows() {
        let store = SledStore::open_temporary().unwrap();

        // Two messages for 2Q (one with an asset row, one orphaned), one for
        // someone else, one of a different type.
        store.put_transaction(&record("111", "2Q")).await.unwrap();
        store.put_transaction(&record("222", "2Q")).await.unwrap();
        store.put_transaction(&record("333", "7Q")).await.unwrap();
        let mut other_type = record("444", "2Q");
        other_type.tx_type = 0;
        store.put_transaction(&other_type).await.unwrap();

        store
            .put_asset_row("asset_messages", "111", "6869")
            .await
            .unwrap();

        let mut rows = store
            .transactions_by_recipient("2Q", 6, "asset_messages")
            .await
            .unwrap();
        rows.sort_by(|a, b| a.record.id.cmp(&b.record.id));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].record.id, "111");
        assert_eq!(rows[0].asset.as_deref(), Some("6869"));
        assert_eq!(rows[1].record.id, "222");
        assert_eq!(rows[1].asset, None, "outer-join miss must surface as None");
    }
}
