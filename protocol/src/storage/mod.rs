//! # Storage Module
//!
//! Persistence for confirmed transactions and their asset payloads.
//!
//! The asset layer never sees sled, bincode, or byte keys — it talks to the
//! [`ChainStore`] trait in terms of table names, transaction ids, and rows,
//! and consumes [`TransactionRow`]s whose optional asset column models the
//! left-outer-join of the generic transaction table with a per-asset table.
//! A missing asset column is data ("this transaction carries no asset of
//! this kind"), not an error.

pub mod store;

pub use store::{ChainStore, SledStore, StorageError, TransactionRecord, TransactionRow};
