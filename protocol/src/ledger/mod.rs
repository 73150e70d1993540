//! # Ledger Module
//!
//! Accounts and the gateway through which asset code mutates them.
//!
//! Every account carries two balances: `balance` (block-confirmed state) and
//! `u_balance` (tentative state, as if every pending-pool transaction were
//! already applied). The two are mutated through disjoint hook pairs of the
//! asset lifecycle and must never be conflated — confirming a block touches
//! `balance`, admitting to or evicting from the pool touches `u_balance`.
//!
//! Asset handlers never touch account storage directly. They describe the
//! change as a signed [`AccountDelta`] and hand it to a
//! [`LedgerAccountGateway`], which applies it atomically and returns the
//! resulting account. Undo is the additive inverse of the same delta, so
//! apply/undo pairs conserve balances by construction.

pub mod account;
pub mod memory;

pub use account::{Account, AccountDelta, AccountRef, LedgerAccountGateway, LedgerError};
pub use memory::MemoryLedger;
