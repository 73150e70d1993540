//! # Asset Module
//!
//! The lifecycle contract every transaction kind implements, the registry
//! the dispatcher resolves handlers from, and the concrete message asset.
//!
//! ## The lifecycle contract
//!
//! An [`AssetHandler`] is the full interface between the generic dispatcher
//! and one asset kind: construction (`create`), pricing (`calculate_fee`),
//! canonical serialization (`get_bytes`), validation (`normalize`,
//! `verify`, `ready`), the two balance hook pairs, and the persistence
//! mapping (`save`/`remove`/`db_read`).
//!
//! The balance hooks form a state machine over each transaction:
//!
//! ```text
//! {unapplied} --apply_unconfirmed--> {pool-pending} --apply--> {confirmed}
//!             <--undo_unconfirmed--                 <--undo--
//! ```
//!
//! A transaction never skips the pending state. `apply`/`undo` touch only
//! the confirmed balance; `apply_unconfirmed`/`undo_unconfirmed` touch only
//! the tentative balance. The contract does no idempotence bookkeeping — the
//! dispatcher guarantees each hook fires at most once per state transition.
//!
//! Hooks are async because `verify`, `save`, and `normalize` may suspend on
//! I/O. Each hook reports its outcome through exactly one `Result` — the
//! single-completion discipline is structural.

pub mod message;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::ledger::{Account, LedgerError};
use crate::storage::{StorageError, TransactionRow};
use crate::transaction::Transaction;

pub use message::{AddMessageRequest, MessageHandler, MESSAGE_TABLE};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by asset lifecycle hooks.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Malformed or out-of-bounds input: oversized message, missing field,
    /// bad encoding. Never retried automatically.
    #[error("asset validation failed: {reason}")]
    Validation { reason: String },

    /// Tentative balance below the required fee. The pending-pool state is
    /// left unchanged — no partial debit.
    #[error("insufficient funds: unconfirmed balance {available} is below required {required}")]
    InsufficientFunds { available: u64, required: u64 },

    /// Propagated verbatim from the ledger gateway.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Propagated verbatim from the persistence layer — not interpreted,
    /// not retried.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A second handler claimed an already-registered type tag.
    #[error("asset type {0} is already attached")]
    TypeAlreadyAttached(u8),
}

// ---------------------------------------------------------------------------
// AssetHandler
// ---------------------------------------------------------------------------

/// The lifecycle contract for one asset kind.
///
/// Implementations hold their own collaborator handles (ledger gateway,
/// chain store) — the dispatcher passes only the transaction and a snapshot
/// of the sender account.
#[async_trait]
pub trait AssetHandler: Send + Sync {
    /// The wire-level type tag this handler owns.
    fn type_tag(&self) -> u8;

    /// Populate asset-specific fields on a skeleton transaction from
    /// caller-supplied request data. Pure — no I/O.
    fn create(
        &self,
        request: &serde_json::Value,
        tx: &mut Transaction,
    ) -> Result<(), AssetError>;

    /// The fee in base units. Pure.
    fn calculate_fee(&self, tx: &Transaction) -> u64;

    /// Canonical serialization of the asset payload, contributed to the
    /// transaction's signable/hashable byte stream. Deterministic, and
    /// injective across distinct legal payloads within one transaction
    /// shape.
    fn get_bytes(&self, tx: &Transaction) -> Result<Vec<u8>, AssetError>;

    /// Schema validation of externally supplied asset data, before it is
    /// trusted anywhere else.
    async fn normalize(&self, asset: &serde_json::Value) -> Result<(), AssetError>;

    /// Semantic validation of a structurally sound transaction.
    async fn verify(&self, tx: &Transaction, sender: &Account) -> Result<(), AssetError>;

    /// Whether all preconditions for pool admission are met (co-signatures
    /// and the like). Asset kinds with no extra preconditions report ready
    /// immediately.
    async fn ready(&self, tx: &Transaction, sender: &Account) -> Result<bool, AssetError> {
        let _ = (tx, sender);
        Ok(true)
    }

    /// Debit the confirmed ledger effect. Invoked on block acceptance.
    async fn apply(&self, tx: &Transaction, sender: &Account) -> Result<(), AssetError>;

    /// Credit back exactly what [`apply`](Self::apply) debited. Invoked on
    /// block reversion.
    async fn undo(&self, tx: &Transaction, sender: &Account) -> Result<(), AssetError>;

    /// Debit the tentative ledger effect on pool admission. Must check
    /// tentative sufficiency first and fail without mutating state.
    async fn apply_unconfirmed(
        &self,
        tx: &Transaction,
        sender: &Account,
    ) -> Result<(), AssetError>;

    /// Credit back exactly what [`apply_unconfirmed`](Self::apply_unconfirmed)
    /// debited. Invoked when a transaction leaves the pool unconfirmed.
    async fn undo_unconfirmed(
        &self,
        tx: &Transaction,
        sender: &Account,
    ) -> Result<(), AssetError>;

    /// Persist the asset payload, keyed by the owning transaction id.
    async fn save(&self, tx: &Transaction) -> Result<(), AssetError>;

    /// Remove the persisted payload alongside its owning transaction
    /// (block reversion cleanup). Default: nothing to remove.
    async fn remove(&self, tx: &Transaction) -> Result<(), AssetError> {
        let _ = tx;
        Ok(())
    }

    /// Map a joined storage row back to an asset payload. `None` means the
    /// outer join missed — this transaction has no asset of this kind.
    fn db_read(&self, row: &TransactionRow) -> Option<serde_json::Value>;
}

// ---------------------------------------------------------------------------
// AssetRegistry
// ---------------------------------------------------------------------------

/// Maps wire-level type tags to their handlers.
///
/// Built once at composition time, then shared immutably (`Arc`) with the
/// dispatcher. Registration is explicit — there is no ambient global to
/// mutate, and a duplicate tag is a wiring bug surfaced at startup.
#[derive(Default)]
pub struct AssetRegistry {
    handlers: HashMap<u8, Arc<dyn AssetHandler>>,
}

impl AssetRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a handler under its own type tag.
    pub fn attach(&mut self, handler: Arc<dyn AssetHandler>) -> Result<(), AssetError> {
        let tag = handler.type_tag();
        if self.handlers.contains_key(&tag) {
            return Err(AssetError::TypeAlreadyAttached(tag));
        }
        self.handlers.insert(tag, handler);
        Ok(())
    }

    /// Resolve the handler for a type tag.
    pub fn get(&self, tag: u8) -> Option<Arc<dyn AssetHandler>> {
        self.handlers.get(&tag).cloned()
    }

    /// Number of attached asset kinds.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if nothing is attached yet.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal handler for registry tests: no-ops everywhere.
    struct NullHandler(u8);

    #[async_trait]
    impl AssetHandler for NullHandler {
        fn type_tag(&self) -> u8 {
            self.0
        }
        fn create(&self, _: &serde_json::Value, _: &mut Transaction) -> Result<(), AssetError> {
            Ok(())
        }
        fn calculate_fee(&self, _: &Transaction) -> u64 {
            0
        }
        fn get_bytes(&self, _: &Transaction) -> Result<Vec<u8>, AssetError> {
            Ok(Vec::new())
        }
        async fn normalize(&self, _: &serde_json::Value) -> Result<(), AssetError> {
            Ok(())
        }
        async fn verify(&self, _: &Transaction, _: &Account) -> Result<(), AssetError> {
            Ok(())
        }
        async fn apply(&self, _: &Transaction, _: &Account) -> Result<(), AssetError> {
            Ok(())
        }
        async fn undo(&self, _: &Transaction, _: &Account) -> Result<(), AssetError> {
            Ok(())
        }
        async fn apply_unconfirmed(&self, _: &Transaction, _: &Account) -> Result<(), AssetError> {
            Ok(())
        }
        async fn undo_unconfirmed(&self, _: &Transaction, _: &Account) -> Result<(), AssetError> {
            Ok(())
        }
        async fn save(&self, _: &Transaction) -> Result<(), AssetError> {
            Ok(())
        }
        fn db_read(&self, _: &TransactionRow) -> Option<serde_json::Value> {
            None
        }
    }

    #[test]
    fn attach_and_resolve() {
        let mut registry = AssetRegistry::new();
        registry.attach(Arc::new(NullHandler(6))).unwrap();

        assert!(registry.get(6).is_some());
        assert!(registry.get(7).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_tag_is_rejected() {
        let mut registry = AssetRegistry::new();
        registry.attach(Arc::new(NullHandler(6))).unwrap();
        let result = registry.attach(Arc::new(NullHandler(6)));
        assert!(matches!(result, Err(AssetError::TypeAlreadyAttached(6))));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn default_ready_reports_true() {
        let handler = NullHandler(1);
        let tx = Transaction::skeleton(1, "1Q", "aa".repeat(32));
        let sender = Account::new("1Q");
        assert!(handler.ready(&tx, &sender).await.unwrap());
    }
}
