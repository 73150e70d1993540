//! # Transaction Dispatcher
//!
//! Owns the pending pool and drives each transaction through the asset
//! lifecycle in the only legal order:
//!
//! ```text
//! normalize → verify (generic + asset) → ready → apply_unconfirmed   (admission)
//! apply → save                                                       (confirmation)
//! undo → re-pool                                                     (block reversion)
//! undo_unconfirmed                                                   (pool eviction)
//! ```
//!
//! Each hook fires at most once per state transition; the contract itself
//! does no idempotence bookkeeping, so the dispatcher is the component that
//! guarantees it. Admission and eviction run under a single admission lock:
//! `apply_unconfirmed` is a read-check-then-mutate sequence and needs
//! exclusivity to keep a burst of submissions from overspending the
//! tentative balance.
//!
//! The dispatcher is wired at composition time from an [`AssetRegistry`],
//! a ledger gateway, and a chain store — no ambient singletons, no
//! late registration.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::asset::{AssetError, AssetHandler, AssetRegistry};
use crate::crypto::{address_from_public_key, sign, QuillKeypair};
use crate::ledger::{Account, AccountRef, LedgerAccountGateway, LedgerError};
use crate::storage::{ChainStore, StorageError};
use crate::transaction::{verify_transaction, Transaction, TransactionError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from dispatcher operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No handler is attached for the transaction's type tag.
    #[error("unknown asset type {0}")]
    UnknownAssetType(u8),

    /// A transaction with this id is already pool-pending.
    #[error("transaction {0} already exists in the pending pool")]
    DuplicateTransaction(String),

    /// The operation requires a pool-pending transaction that isn't there.
    #[error("transaction {0} is not in the pending pool")]
    NotInPool(String),

    /// Admission preconditions (e.g. required co-signatures) are not met.
    #[error("transaction {0} is not ready for pool admission")]
    NotReady(String),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// The generic transaction processor.
pub struct Dispatcher {
    registry: Arc<AssetRegistry>,
    ledger: Arc<dyn LedgerAccountGateway>,
    store: Arc<dyn ChainStore>,
    /// Pool-pending transactions keyed by id.
    pool: DashMap<String, Transaction>,
    /// Serializes pool admission and eviction. The sufficiency check in
    /// `apply_unconfirmed` reads then mutates; interleaving two admissions
    /// for one account could overspend the tentative balance.
    admission: Mutex<()>,
}

impl Dispatcher {
    /// Wire up a dispatcher. The registry is fixed from here on — attach
    /// every asset kind before constructing.
    pub fn new(
        registry: Arc<AssetRegistry>,
        ledger: Arc<dyn LedgerAccountGateway>,
        store: Arc<dyn ChainStore>,
    ) -> Self {
        Self {
            registry,
            ledger,
            store,
            pool: DashMap::new(),
            admission: Mutex::new(()),
        }
    }

    fn handler(&self, tag: u8) -> Result<Arc<dyn AssetHandler>, DispatchError> {
        self.registry
            .get(tag)
            .ok_or(DispatchError::UnknownAssetType(tag))
    }

    /// Snapshot of the sender account, or a fresh zero-balance account if
    /// the sender has never been seen (it will then fail funds checks the
    /// honest way).
    async fn sender_account(&self, tx: &Transaction) -> Result<Account, DispatchError> {
        let reference = AccountRef::PublicKey(tx.sender_public_key.clone());
        if let Some(account) = self.ledger.get_account(&reference).await? {
            return Ok(account);
        }
        let mut account = Account::new(reference.resolve_address()?);
        account.public_key = Some(tx.sender_public_key.clone());
        Ok(account)
    }

    /// Build, sign, and id-stamp a transaction of the given type.
    ///
    /// The handler populates the asset fields and prices the fee; the
    /// dispatcher computes the canonical bytes, signs them with the
    /// caller's keypair, and derives the id from the signed form. The
    /// result is ready for [`process_unconfirmed`](Self::process_unconfirmed).
    pub async fn create_transaction(
        &self,
        tx_type: u8,
        keypair: &QuillKeypair,
        request: &serde_json::Value,
    ) -> Result<Transaction, DispatchError> {
        let handler = self.handler(tx_type)?;

        let mut tx = Transaction::skeleton(
            tx_type,
            address_from_public_key(&keypair.public_key()),
            keypair.public_key_hex(),
        );
        handler.create(request, &mut tx)?;
        tx.fee = handler.calculate_fee(&tx);

        let asset_bytes = handler.get_bytes(&tx)?;
        let signature = sign(keypair, &tx.signable_bytes(&asset_bytes)?);
        tx.signature = Some(signature.to_hex());
        tx.id = tx.compute_id(&asset_bytes)?;

        Ok(tx)
    }

    /// Admit a signed transaction into the pending pool.
    ///
    /// Runs the full admission sequence: `normalize` on the untrusted asset
    /// payload, generic verification (id, sender, signature), the handler's
    /// `verify` and `ready`, then `apply_unconfirmed` against the tentative
    /// balance. Any failure leaves both the pool and the ledger unchanged.
    pub async fn process_unconfirmed(
        &self,
        tx: Transaction,
    ) -> Result<Transaction, DispatchError> {
        let handler = self.handler(tx.tx_type)?;

        handler.normalize(&tx.asset).await?;
        let asset_bytes = handler.get_bytes(&tx)?;
        verify_transaction(&tx, &asset_bytes)?;

        let _admission = self.admission.lock().await;

        if self.pool.contains_key(&tx.id) {
            return Err(DispatchError::DuplicateTransaction(tx.id));
        }

        let sender = self.sender_account(&tx).await?;
        handler.verify(&tx, &sender).await?;
        if !handler.ready(&tx, &sender).await? {
            return Err(DispatchError::NotReady(tx.id));
        }
        handler.apply_unconfirmed(&tx, &sender).await?;

        self.pool.insert(tx.id.clone(), tx.clone());
        tracing::info!(
            id = %tx.id,
            tx_type = tx.tx_type,
            sender = %tx.sender_id,
            "transaction admitted to pending pool"
        );
        Ok(tx)
    }

    /// Confirm a pool-pending transaction into a block: `apply` against the
    /// confirmed balance, persist the generic row and the asset row, then
    /// drop it from the pool. The tentative debit from admission stays in
    /// place — after confirmation it is accounted for by the confirmed
    /// balance itself.
    pub async fn confirm(
        &self,
        tx_id: &str,
        block_id: &str,
    ) -> Result<Transaction, DispatchError> {
        let mut tx = self
            .pool
            .get(tx_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DispatchError::NotInPool(tx_id.to_string()))?;
        let handler = self.handler(tx.tx_type)?;

        let sender = self.sender_account(&tx).await?;
        handler.apply(&tx, &sender).await?;

        tx.block_id = Some(block_id.to_string());
        self.store.put_transaction(&tx.to_record()).await?;
        handler.save(&tx).await?;

        self.pool.remove(tx_id);
        tracing::info!(id = %tx.id, block_id = %block_id, "transaction confirmed");
        Ok(tx)
    }

    /// Revert a confirmed transaction on block reversion: `undo` the
    /// confirmed debit, remove the persisted rows, and return the
    /// transaction to the pending pool (its tentative debit never went
    /// away, so pool state is immediately consistent).
    pub async fn undo_confirmed(&self, tx: &Transaction) -> Result<Transaction, DispatchError> {
        let handler = self.handler(tx.tx_type)?;

        let sender = self.sender_account(tx).await?;
        handler.undo(tx, &sender).await?;

        self.store.delete_transaction(&tx.id).await?;
        handler.remove(tx).await?;

        let mut reverted = tx.clone();
        reverted.block_id = None;
        self.pool.insert(reverted.id.clone(), reverted.clone());
        tracing::info!(id = %tx.id, "transaction reverted to pending pool");
        Ok(reverted)
    }

    /// Evict a pool-pending transaction and credit back its tentative
    /// debit.
    pub async fn undo_unconfirmed(&self, tx_id: &str) -> Result<Transaction, DispatchError> {
        let _admission = self.admission.lock().await;

        let (_, tx) = self
            .pool
            .remove(tx_id)
            .ok_or_else(|| DispatchError::NotInPool(tx_id.to_string()))?;
        let handler = self.handler(tx.tx_type)?;

        let sender = self.sender_account(&tx).await?;
        handler.undo_unconfirmed(&tx, &sender).await?;

        tracing::info!(id = %tx.id, "transaction evicted from pending pool");
        Ok(tx)
    }

    /// Look up a pool-pending transaction by id.
    pub fn pending(&self, tx_id: &str) -> Option<Transaction> {
        self.pool.get(tx_id).map(|entry| entry.value().clone())
    }

    /// Number of pool-pending transactions.
    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    /// Returns `true` if the pending pool is empty.
    pub fn pool_is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{MessageHandler, MESSAGE_TABLE};
    use crate::config::{MESSAGE_FEE, MESSAGE_TYPE};
    use crate::ledger::MemoryLedger;
    use crate::storage::SledStore;
    use serde_json::json;

    fn setup() -> (Dispatcher, Arc<MemoryLedger>, Arc<SledStore>) {
        let ledger: Arc<MemoryLedger> = Arc::new(MemoryLedger::new());
        let store = Arc::new(SledStore::open_temporary().expect("temp store"));
        let mut registry = AssetRegistry::new();
        registry
            .attach(Arc::new(MessageHandler::new(ledger.clone(), store.clone())))
            .unwrap();
        let dispatcher = Dispatcher::new(Arc::new(registry), ledger.clone(), store.clone());
        (dispatcher, ledger, store)
    }

    fn sender_keypair() -> QuillKeypair {
        QuillKeypair::from_passphrase("robust swift grow")
    }

    fn sender_address() -> String {
        address_from_public_key(&sender_keypair().public_key())
    }

    async fn build_message_tx(dispatcher: &Dispatcher) -> Transaction {
        dispatcher
            .create_transaction(
                MESSAGE_TYPE,
                &sender_keypair(),
                &json!({ "recipientId": "R", "message": "hi" }),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_transaction_produces_the_expected_shape() {
        let (dispatcher, _, _) = setup();
        let tx = build_message_tx(&dispatcher).await;

        assert_eq!(tx.tx_type, 6);
        assert_eq!(tx.fee, 100_000_000);
        assert_eq!(tx.recipient_id.as_deref(), Some("R"));
        assert_eq!(tx.asset["message"], "6869");

        let sig = tx.signature.as_ref().unwrap();
        assert_eq!(sig.len(), 128);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));

        assert!(tx.id.parse::<u64>().is_ok());
        assert!(tx.block_id.is_none());
    }

    #[tokio::test]
    async fn create_transaction_is_deterministic() {
        let (dispatcher, _, _) = setup();
        let tx1 = build_message_tx(&dispatcher).await;
        let tx2 = build_message_tx(&dispatcher).await;
        // Same passphrase, same payload, no timestamps: byte-identical
        // signature and id on every node.
        assert_eq!(tx1.signature, tx2.signature);
        assert_eq!(tx1.id, tx2.id);
    }

    #[tokio::test]
    async fn unknown_asset_type_is_rejected() {
        let (dispatcher, _, _) = setup();
        let result = dispatcher
            .create_transaction(250, &sender_keypair(), &json!({}))
            .await;
        assert!(matches!(result, Err(DispatchError::UnknownAssetType(250))));
    }

    #[tokio::test]
    async fn admission_debits_tentative_balance_only() {
        let (dispatcher, ledger, _) = setup();
        ledger.seed(&sender_address(), 3 * MESSAGE_FEE);

        let tx = build_message_tx(&dispatcher).await;
        dispatcher.process_unconfirmed(tx.clone()).await.unwrap();

        assert_eq!(dispatcher.pool_len(), 1);
        assert!(dispatcher.pending(&tx.id).is_some());

        let sender = ledger
            .get_account(&AccountRef::Address(sender_address()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sender.u_balance, 2 * MESSAGE_FEE);
        assert_eq!(sender.balance, 3 * MESSAGE_FEE);
    }

    #[tokio::test]
    async fn duplicate_admission_is_rejected() {
        let (dispatcher, ledger, _) = setup();
        ledger.seed(&sender_address(), 3 * MESSAGE_FEE);

        let tx = build_message_tx(&dispatcher).await;
        dispatcher.process_unconfirmed(tx.clone()).await.unwrap();
        let result = dispatcher.process_unconfirmed(tx).await;
        assert!(matches!(
            result,
            Err(DispatchError::DuplicateTransaction(_))
        ));
        assert_eq!(dispatcher.pool_len(), 1);
    }

    #[tokio::test]
    async fn insufficient_funds_leaves_pool_and_ledger_unchanged() {
        let (dispatcher, ledger, _) = setup();
        ledger.seed(&sender_address(), 0);

        let tx = build_message_tx(&dispatcher).await;
        let result = dispatcher.process_unconfirmed(tx).await;
        assert!(matches!(
            result,
            Err(DispatchError::Asset(AssetError::InsufficientFunds { .. }))
        ));

        assert!(dispatcher.pool_is_empty());
        let sender = ledger
            .get_account(&AccountRef::Address(sender_address()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sender.u_balance, 0);
    }

    #[tokio::test]
    async fn tampered_transaction_is_rejected_at_admission() {
        let (dispatcher, ledger, _) = setup();
        ledger.seed(&sender_address(), 3 * MESSAGE_FEE);

        let mut tx = build_message_tx(&dispatcher).await;
        tx.asset = json!({ "message": "deadbeef" });
        let result = dispatcher.process_unconfirmed(tx).await;
        assert!(matches!(result, Err(DispatchError::Transaction(_))));
        assert!(dispatcher.pool_is_empty());
    }

    #[tokio::test]
    async fn confirm_debits_confirmed_balance_and_persists() {
        let (dispatcher, ledger, store) = setup();
        ledger.seed(&sender_address(), 3 * MESSAGE_FEE);

        let tx = build_message_tx(&dispatcher).await;
        dispatcher.process_unconfirmed(tx.clone()).await.unwrap();
        let confirmed = dispatcher.confirm(&tx.id, "424242").await.unwrap();

        assert_eq!(confirmed.block_id.as_deref(), Some("424242"));
        assert!(dispatcher.pool_is_empty());

        let sender = ledger
            .get_account(&AccountRef::Address(sender_address()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sender.balance, 2 * MESSAGE_FEE);
        assert_eq!(sender.u_balance, 2 * MESSAGE_FEE);

        let record = store.get_transaction(&tx.id).await.unwrap().unwrap();
        assert_eq!(record.block_id.as_deref(), Some("424242"));
        let asset_row = store.get_asset_row(MESSAGE_TABLE, &tx.id).await.unwrap();
        assert_eq!(asset_row.as_deref(), Some("6869"));
    }

    #[tokio::test]
    async fn confirm_requires_the_pending_state() {
        let (dispatcher, _, _) = setup();
        let result = dispatcher.confirm("12345", "1").await;
        assert!(matches!(result, Err(DispatchError::NotInPool(_))));
    }

    #[tokio::test]
    async fn undo_confirmed_credits_back_and_repools() {
        let (dispatcher, ledger, store) = setup();
        ledger.seed(&sender_address(), 3 * MESSAGE_FEE);

        let tx = build_message_tx(&dispatcher).await;
        dispatcher.process_unconfirmed(tx.clone()).await.unwrap();
        let confirmed = dispatcher.confirm(&tx.id, "424242").await.unwrap();

        let reverted = dispatcher.undo_confirmed(&confirmed).await.unwrap();
        assert!(reverted.block_id.is_none());
        assert!(dispatcher.pending(&tx.id).is_some());

        let sender = ledger
            .get_account(&AccountRef::Address(sender_address()))
            .await
            .unwrap()
            .unwrap();
        // Confirmed debit undone; tentative debit still reflects the
        // re-pooled transaction.
        assert_eq!(sender.balance, 3 * MESSAGE_FEE);
        assert_eq!(sender.u_balance, 2 * MESSAGE_FEE);

        assert!(store.get_transaction(&tx.id).await.unwrap().is_none());
        assert!(store
            .get_asset_row(MESSAGE_TABLE, &tx.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn undo_unconfirmed_credits_tentative_balance_back() {
        let (dispatcher, ledger, _) = setup();
        ledger.seed(&sender_address(), 3 * MESSAGE_FEE);

        let tx = build_message_tx(&dispatcher).await;
        dispatcher.process_unconfirmed(tx.clone()).await.unwrap();
        dispatcher.undo_unconfirmed(&tx.id).await.unwrap();

        assert!(dispatcher.pool_is_empty());
        let sender = ledger
            .get_account(&AccountRef::Address(sender_address()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sender.u_balance, 3 * MESSAGE_FEE);
        assert_eq!(sender.balance, 3 * MESSAGE_FEE);
    }

    #[tokio::test]
    async fn full_reorg_cycle_conserves_balances() {
        let (dispatcher, ledger, _) = setup();
        ledger.seed(&sender_address(), 5 * MESSAGE_FEE);

        let tx = build_message_tx(&dispatcher).await;
        dispatcher.process_unconfirmed(tx.clone()).await.unwrap();
        let confirmed = dispatcher.confirm(&tx.id, "1").await.unwrap();
        dispatcher.undo_confirmed(&confirmed).await.unwrap();
        dispatcher.undo_unconfirmed(&tx.id).await.unwrap();

        // Applied and fully unwound: back to the starting state.
        let sender = ledger
            .get_account(&AccountRef::Address(sender_address()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sender.balance, 5 * MESSAGE_FEE);
        assert_eq!(sender.u_balance, 5 * MESSAGE_FEE);
        assert!(dispatcher.pool_is_empty());
    }
}
