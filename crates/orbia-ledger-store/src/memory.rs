//! In-memory storage implementation, for tests and CLI dry runs only.
//!
//! All tables sit behind one mutex and a [`MemoryTx`] holds it for its whole
//! lifetime, so every transaction is serialized store-wide. That is coarser
//! than the per-row locking production relies on; concurrency guarantees are
//! provided by `RocksStore` and its row locks. Writes are applied in
//! place and recorded in an undo log that is replayed if the transaction is
//! dropped without a commit.

use std::collections::HashMap;

use parking_lot::{Mutex, MutexGuard};

use orbia_ledger_core::{
    AccountId, BalanceDelta, EntryFilter, LedgerEntry, OrderFilter, OrderId, PageRequest,
    RechargeOrder, TransactionId, Wallet,
};

use crate::error::{Result, StoreError};
use crate::{adjust_row, check_entry, Adjusted, Store, StoreTx};

#[derive(Debug, Default)]
struct Tables {
    wallets: HashMap<AccountId, Wallet>,
    entries: HashMap<TransactionId, LedgerEntry>,
    entries_by_account: HashMap<AccountId, Vec<TransactionId>>,
    orders: HashMap<OrderId, RechargeOrder>,
}

/// In-process storage backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    type Tx<'a> = MemoryTx<'a>;

    fn begin(&self) -> Result<MemoryTx<'_>> {
        Ok(MemoryTx {
            tables: self.tables.lock(),
            undo: Vec::new(),
            committed: false,
        })
    }

    fn create_wallet_if_absent(&self, account_id: AccountId) -> Result<Wallet> {
        let mut tables = self.tables.lock();
        let wallet = tables
            .wallets
            .entry(account_id)
            .or_insert_with(|| Wallet::new(account_id));
        Ok(wallet.clone())
    }

    fn get_wallet(&self, account_id: AccountId) -> Result<Option<Wallet>> {
        Ok(self.tables.lock().wallets.get(&account_id).cloned())
    }

    fn get_entry(&self, transaction_id: &TransactionId) -> Result<Option<LedgerEntry>> {
        Ok(self.tables.lock().entries.get(transaction_id).cloned())
    }

    fn list_entries(
        &self,
        account_id: AccountId,
        filter: &EntryFilter,
        page: PageRequest,
    ) -> Result<(Vec<LedgerEntry>, u64)> {
        let tables = self.tables.lock();
        let mut entries: Vec<&LedgerEntry> = tables
            .entries_by_account
            .get(&account_id)
            .into_iter()
            .flatten()
            .filter_map(|id| tables.entries.get(id))
            .filter(|entry| filter.matches(entry))
            .collect();

        entries.sort_by(|a, b| {
            (b.created_at, b.transaction_id).cmp(&(a.created_at, a.transaction_id))
        });

        Ok(page.slice(entries.into_iter().cloned()))
    }

    fn insert_order(&self, order: &RechargeOrder) -> Result<()> {
        let mut tables = self.tables.lock();
        if tables.orders.contains_key(&order.order_id) {
            return Err(StoreError::duplicate("order", order.order_id));
        }
        tables.orders.insert(order.order_id, order.clone());
        Ok(())
    }

    fn get_order(&self, order_id: &OrderId) -> Result<Option<RechargeOrder>> {
        Ok(self.tables.lock().orders.get(order_id).cloned())
    }

    fn list_orders(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<(Vec<RechargeOrder>, u64)> {
        let tables = self.tables.lock();
        let mut orders: Vec<&RechargeOrder> =
            tables.orders.values().filter(|o| filter.matches(o)).collect();
        orders.sort_by(|a, b| b.order_id.cmp(&a.order_id));

        Ok(page.slice(orders.into_iter().cloned()))
    }
}

enum Undo {
    Wallet(Wallet),
    Entry(AccountId, TransactionId),
    Order(RechargeOrder),
}

/// Transaction over a [`MemoryStore`].
pub struct MemoryTx<'a> {
    tables: MutexGuard<'a, Tables>,
    undo: Vec<Undo>,
    committed: bool,
}

impl StoreTx for MemoryTx<'_> {
    fn get_order_for_update(&mut self, order_id: &OrderId) -> Result<Option<RechargeOrder>> {
        Ok(self.tables.orders.get(order_id).cloned())
    }

    fn conditional_adjust(&mut self, account_id: AccountId, delta: &BalanceDelta) -> Result<Adjusted> {
        let current = self
            .tables
            .wallets
            .get(&account_id)
            .ok_or_else(|| StoreError::not_found("wallet", account_id))?;

        let adjusted = adjust_row(current, delta)?;
        self.undo.push(Undo::Wallet(adjusted.before.clone()));
        self.tables.wallets.insert(account_id, adjusted.after.clone());
        Ok(adjusted)
    }

    fn append_entry(&mut self, entry: &LedgerEntry) -> Result<()> {
        if self.tables.entries.contains_key(&entry.transaction_id) {
            return Err(StoreError::duplicate("transaction", entry.transaction_id));
        }
        check_entry(entry, self.tables.wallets.get(&entry.account_id))?;

        self.tables
            .entries
            .insert(entry.transaction_id, entry.clone());
        self.tables
            .entries_by_account
            .entry(entry.account_id)
            .or_default()
            .push(entry.transaction_id);
        self.undo
            .push(Undo::Entry(entry.account_id, entry.transaction_id));
        Ok(())
    }

    fn update_order(&mut self, order: &RechargeOrder) -> Result<()> {
        let previous = self
            .tables
            .orders
            .get(&order.order_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("order", order.order_id))?;

        self.tables.orders.insert(order.order_id, order.clone());
        self.undo.push(Undo::Order(previous));
        Ok(())
    }

    fn commit(mut self) -> Result<()> {
        self.committed = true;
        Ok(())
    }
}

impl Drop for MemoryTx<'_> {
    fn drop(&mut self) {
        if self.committed || self.undo.is_empty() {
            return;
        }

        tracing::debug!(writes = self.undo.len(), "Rolling back memory transaction");
        while let Some(undo) = self.undo.pop() {
            match undo {
                Undo::Wallet(wallet) => {
                    self.tables.wallets.insert(wallet.account_id, wallet);
                }
                Undo::Entry(account_id, transaction_id) => {
                    self.tables.entries.remove(&transaction_id);
                    if let Some(ids) = self.tables.entries_by_account.get_mut(&account_id) {
                        ids.retain(|id| *id != transaction_id);
                    }
                }
                Undo::Order(order) => {
                    self.tables.orders.insert(order.order_id, order);
                }
            }
        }
    }
}
