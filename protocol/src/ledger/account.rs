//! Account state and the balance-mutation gateway contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{address_from_public_key, QuillPublicKey};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from delta application against an account.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The delta would push a balance below zero.
    #[error("balance underflow on {address}: {field} {current} with delta {delta}")]
    Underflow {
        address: String,
        field: &'static str,
        current: u64,
        delta: i64,
    },

    /// The delta would push a balance past `u64::MAX`.
    ///
    /// If you're hitting this, someone is crediting more than 18.4
    /// quintillion base units. That's either a bug or an attack.
    #[error("balance overflow on {address}: {field} {current} with delta {delta}")]
    Overflow {
        address: String,
        field: &'static str,
        current: u64,
        delta: i64,
    },

    /// A delta referenced an account by a malformed public key.
    #[error("invalid public key in account reference: {0}")]
    InvalidPublicKey(String),
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// The ledger state of a single account.
///
/// `public_key` is `None` until the account first appears as a transaction
/// sender — recipients are created address-only and learn their key on first
/// outbound use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Decimal account number with network suffix, e.g. `6845…096Q`.
    pub address: String,
    /// Hex-encoded Ed25519 public key, once known.
    pub public_key: Option<String>,
    /// Block-confirmed balance in base units.
    pub balance: u64,
    /// Tentative balance in base units: confirmed state as if all
    /// pending-pool transactions were applied.
    pub u_balance: u64,
}

impl Account {
    /// A fresh zero-balance account for an address.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            public_key: None,
            balance: 0,
            u_balance: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// AccountRef / AccountDelta
// ---------------------------------------------------------------------------

/// How a delta names its target account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountRef {
    /// By ledger address.
    Address(String),
    /// By hex-encoded public key; the address is derived from it and the
    /// key is recorded on the account on first use.
    PublicKey(String),
}

impl AccountRef {
    /// Resolve the ledger address this reference points at.
    pub fn resolve_address(&self) -> Result<String, LedgerError> {
        match self {
            AccountRef::Address(address) => Ok(address.clone()),
            AccountRef::PublicKey(hex) => {
                let pk = QuillPublicKey::from_hex(hex)
                    .map_err(|_| LedgerError::InvalidPublicKey(hex.clone()))?;
                Ok(address_from_public_key(&pk))
            }
        }
    }
}

/// A signed change to one account's balances.
///
/// Fields left at zero are untouched — a confirmed-balance delta never
/// brushes against `u_balance` and vice versa. Undo applies the additive
/// inverse (see [`AccountDelta::inverse`]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountDelta {
    /// The account being changed.
    pub target: AccountRef,
    /// Signed change to the confirmed balance, in base units.
    pub balance: i64,
    /// Signed change to the tentative balance, in base units.
    pub u_balance: i64,
}

impl AccountDelta {
    /// A delta touching only the confirmed balance.
    pub fn balance(target: AccountRef, amount: i64) -> Self {
        Self {
            target,
            balance: amount,
            u_balance: 0,
        }
    }

    /// A delta touching only the tentative balance.
    pub fn unconfirmed(target: AccountRef, amount: i64) -> Self {
        Self {
            target,
            balance: 0,
            u_balance: amount,
        }
    }

    /// The additive inverse: applying `delta` then `delta.inverse()` leaves
    /// the account exactly where it started.
    pub fn inverse(&self) -> Self {
        Self {
            target: self.target.clone(),
            balance: -self.balance,
            u_balance: -self.u_balance,
        }
    }
}

// ---------------------------------------------------------------------------
// LedgerAccountGateway
// ---------------------------------------------------------------------------

/// The only door between asset logic and account storage.
///
/// Implementations must apply each delta atomically per account and
/// serialize mutations against the same account; the asset layer performs
/// read-check-then-mutate sequences and relies on that exclusivity.
#[async_trait]
pub trait LedgerAccountGateway: Send + Sync {
    /// Look up an account. `Ok(None)` means the account has never been seen.
    async fn get_account(&self, target: &AccountRef) -> Result<Option<Account>, LedgerError>;

    /// Apply a signed delta to the named account (creating it if needed)
    /// and return the resulting state.
    async fn merge_account_and_get(&self, delta: AccountDelta) -> Result<Account, LedgerError>;

    /// Apply the additive inverse of `delta` and return the resulting state.
    async fn undo_merging(&self, delta: AccountDelta) -> Result<Account, LedgerError>;
}
