//! In-memory ledger gateway.
//!
//! The account map lives behind a single `parking_lot::RwLock`, which makes
//! per-account mutation trivially serialized — exactly the exclusivity the
//! asset layer's read-check-then-mutate sequences assume. Suitable for the
//! devnet node and for tests; a production deployment would back the same
//! trait with the relational store.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::account::{Account, AccountDelta, AccountRef, LedgerAccountGateway, LedgerError};

/// Thread-safe in-memory implementation of [`LedgerAccountGateway`].
#[derive(Default)]
pub struct MemoryLedger {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Devnet faucet: set an account's confirmed and tentative balances to
    /// `amount`, creating the account if needed. Test/devnet only — there is
    /// deliberately no way to reach this through the gateway trait.
    pub fn seed(&self, address: &str, amount: u64) {
        let mut accounts = self.accounts.write();
        let account = accounts
            .entry(address.to_string())
            .or_insert_with(|| Account::new(address));
        account.balance = amount;
        account.u_balance = amount;
    }

    /// Number of accounts ever touched.
    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    /// Returns `true` if no account has been created yet.
    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }

    fn apply_delta(&self, delta: &AccountDelta) -> Result<Account, LedgerError> {
        let address = delta.target.resolve_address()?;
        let mut accounts = self.accounts.write();
        let account = accounts
            .entry(address.clone())
            .or_insert_with(|| Account::new(address.clone()));

        // Record the public key on first use.
        if account.public_key.is_none() {
            if let AccountRef::PublicKey(hex) = &delta.target {
                account.public_key = Some(hex.clone());
            }
        }

        let balance = checked_apply(&address, "balance", account.balance, delta.balance)?;
        let u_balance = checked_apply(&address, "u_balance", account.u_balance, delta.u_balance)?;

        // Both fields validated before either is written: a failing delta
        // leaves the account untouched.
        account.balance = balance;
        account.u_balance = u_balance;
        Ok(account.clone())
    }
}

/// Apply a signed delta to a `u64` balance with range checking.
fn checked_apply(
    address: &str,
    field: &'static str,
    current: u64,
    delta: i64,
) -> Result<u64, LedgerError> {
    let next = current as i128 + delta as i128;
    if next < 0 {
        return Err(LedgerError::Underflow {
            address: address.to_string(),
            field,
            current,
            delta,
        });
    }
    u64::try_from(next).map_err(|_| LedgerError::Overflow {
        address: address.to_string(),
        field,
        current,
        delta,
    })
}

#[async_trait]
impl LedgerAccountGateway for MemoryLedger {
    async fn get_account(&self, target: &AccountRef) -> Result<Option<Account>, LedgerError> {
        let address = target.resolve_address()?;
        Ok(self.accounts.read().get(&address).cloned())
    }

    async fn merge_account_and_get(&self, delta: AccountDelta) -> Result<Account, LedgerError> {
        self.apply_delta(&delta)
    }

    async fn undo_merging(&self, delta: AccountDelta) -> Result<Account, LedgerError> {
        self.apply_delta(&delta.inverse())
    }
}
