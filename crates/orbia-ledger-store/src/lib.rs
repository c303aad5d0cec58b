//! Storage layer for the orbia wallet ledger.
//!
//! Wallets, ledger entries and recharge orders live behind the [`Store`]
//! trait. Multi-step units run inside a [`StoreTx`]: dropping it without
//! calling [`StoreTx::commit`] rolls every write back.
//!
//! # Backends
//!
//! - [`MemoryStore`]: in-process tables, used by tests and the CLI dry runs.
//! - `RocksStore` (feature `rocksdb-backend`): a `RocksDB` `TransactionDB`
//!   with the column families listed in [`schema`].
//!
//! # Example
//!
//! ```
//! use orbia_ledger_core::{AccountId, BalanceDelta};
//! use orbia_ledger_store::{MemoryStore, Store, StoreTx};
//!
//! let store = MemoryStore::new();
//! store.create_wallet_if_absent(AccountId::new(42)).unwrap();
//!
//! let mut tx = store.begin().unwrap();
//! let adjusted = tx.conditional_adjust(AccountId::new(42), &BalanceDelta::recharge(10_000)).unwrap();
//! tx.commit().unwrap();
//!
//! assert_eq!(adjusted.after.balance_cents, 10_000);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use chrono::Utc;
use orbia_ledger_core::{
    AccountId, BalanceDelta, EntryFilter, EntryStatus, LedgerEntry, LedgerError, OrderFilter,
    OrderId, PageRequest, RechargeOrder, TransactionId, Wallet,
};

/// Wallet rows immediately before and after one conditional adjust.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjusted {
    /// Row as it was when the predicate was evaluated.
    pub before: Wallet,
    /// Row as written.
    pub after: Wallet,
}

/// The storage trait.
///
/// Reads and single-record writes are available directly; anything that must
/// be atomic across records goes through [`Store::begin`].
pub trait Store: Send + Sync {
    /// Transaction handle. Rolls back on drop unless committed.
    type Tx<'a>: StoreTx
    where
        Self: 'a;

    /// Open a store transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot start a transaction.
    fn begin(&self) -> Result<Self::Tx<'_>>;

    // =========================================================================
    // Wallet Operations
    // =========================================================================

    /// Insert a zero wallet unless one exists. Returns the stored wallet.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn create_wallet_if_absent(&self, account_id: AccountId) -> Result<Wallet>;

    /// Get a wallet by account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_wallet(&self, account_id: AccountId) -> Result<Option<Wallet>>;

    /// Apply one conditional adjust in its own transaction.
    ///
    /// # Errors
    ///
    /// Same as [`StoreTx::conditional_adjust`].
    fn conditional_adjust(&self, account_id: AccountId, delta: &BalanceDelta) -> Result<Adjusted> {
        let mut tx = self.begin()?;
        let adjusted = tx.conditional_adjust(account_id, delta)?;
        tx.commit()?;
        Ok(adjusted)
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    /// Get a ledger entry by transaction ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_entry(&self, transaction_id: &TransactionId) -> Result<Option<LedgerEntry>>;

    /// List an account's entries, newest first, with the total match count.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_entries(
        &self,
        account_id: AccountId,
        filter: &EntryFilter,
        page: PageRequest,
    ) -> Result<(Vec<LedgerEntry>, u64)>;

    // =========================================================================
    // Recharge Order Operations
    // =========================================================================

    /// Insert a new order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Duplicate` if the order ID is taken.
    fn insert_order(&self, order: &RechargeOrder) -> Result<()>;

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_order(&self, order_id: &OrderId) -> Result<Option<RechargeOrder>>;

    /// List orders, newest first, with the total match count.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_orders(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<(Vec<RechargeOrder>, u64)>;
}

/// Operations available inside a store transaction.
///
/// Records read through this handle stay locked until the transaction ends.
pub trait StoreTx {
    /// Read an order and lock it for the rest of the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_order_for_update(&mut self, order_id: &OrderId) -> Result<Option<RechargeOrder>>;

    /// Atomically check `balance + Δb >= 0 && frozen + Δf >= 0` and apply the
    /// delta, returning the row before and after.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account has no wallet.
    /// - `StoreError::InsufficientFunds` if the predicate fails.
    /// - `StoreError::InvalidAdjustment` on overflow or a negative total increment.
    fn conditional_adjust(&mut self, account_id: AccountId, delta: &BalanceDelta) -> Result<Adjusted>;

    /// Append a ledger entry.
    ///
    /// # Errors
    ///
    /// - `StoreError::Duplicate` if the transaction ID exists.
    /// - `StoreError::InconsistentEntry` if the snapshots do not add up or a
    ///   completed entry disagrees with the wallet balance in this transaction.
    fn append_entry(&mut self, entry: &LedgerEntry) -> Result<()>;

    /// Overwrite an existing order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the order does not exist.
    fn update_order(&mut self, order: &RechargeOrder) -> Result<()>;

    /// Make every write of this transaction durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails; nothing is applied in that case.
    fn commit(self) -> Result<()>;
}

/// Evaluate a conditional adjust against the current row.
pub(crate) fn adjust_row(current: &Wallet, delta: &BalanceDelta) -> Result<Adjusted> {
    let overflow = || StoreError::InvalidAdjustment {
        account_id: current.account_id,
        reason: format!("{delta:?} overflows the wallet row"),
    };
    let balance = current
        .balance_cents
        .checked_add(delta.balance_cents)
        .ok_or_else(overflow)?;
    let frozen = current
        .frozen_balance_cents
        .checked_add(delta.frozen_cents)
        .ok_or_else(overflow)?;

    if balance < 0 || frozen < 0 {
        return Err(StoreError::InsufficientFunds {
            account_id: current.account_id,
            balance_cents: current.balance_cents,
            frozen_balance_cents: current.frozen_balance_cents,
            balance_delta: delta.balance_cents,
            frozen_delta: delta.frozen_cents,
        });
    }

    let after = current
        .apply(delta, Utc::now())
        .ok_or_else(|| StoreError::InvalidAdjustment {
            account_id: current.account_id,
            reason: format!("{delta:?} cannot be applied"),
        })?;

    Ok(Adjusted {
        before: current.clone(),
        after,
    })
}

/// Validate an entry against its own invariant and the wallet it describes.
pub(crate) fn check_entry(entry: &LedgerEntry, wallet: Option<&Wallet>) -> Result<()> {
    entry.check_consistency()?;

    if entry.status == EntryStatus::Completed {
        let Some(wallet) = wallet else {
            return Err(StoreError::not_found("wallet", entry.account_id));
        };
        if wallet.balance_cents != entry.balance_after_cents {
            return Err(LedgerError::InconsistentEntry {
                transaction_id: entry.transaction_id.to_string(),
                reason: format!(
                    "balance_after {} does not match wallet balance {}",
                    entry.balance_after_cents, wallet.balance_cents
                ),
            }
            .into());
        }
    }

    Ok(())
}
