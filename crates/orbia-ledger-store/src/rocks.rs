//! `RocksDB` storage implementation.
//!
//! Backed by a pessimistic `TransactionDB`: every row a [`RocksTx`] reads for
//! update stays locked until the transaction commits or is dropped.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, MultiThreaded, Options,
    Transaction, TransactionDB, TransactionDBOptions,
};

use orbia_ledger_core::{
    AccountId, BalanceDelta, EntryFilter, LedgerEntry, OrderFilter, OrderId, PageRequest,
    RechargeOrder, TransactionId, Wallet,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{adjust_row, check_entry, Adjusted, Store, StoreTx};

type Db = TransactionDB<MultiThreaded>;

/// How long a transaction waits for a row lock held by another one.
const LOCK_TIMEOUT_MS: i64 = 5_000;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<Db>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let mut txn_opts = TransactionDBOptions::default();
        txn_opts.set_txn_lock_timeout(LOCK_TIMEOUT_MS);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = Db::open_cf_descriptors(&opts, &txn_opts, path.as_ref(), cf_descriptors)
            .map_err(db_err)?;

        tracing::info!(path = %path.as_ref().display(), "Opened ledger database");
        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        cf_handle(&self.db, name)
    }

    fn get<T: serde::de::DeserializeOwned>(&self, name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(db_err)?
            .map(|data| deserialize(&data))
            .transpose()
    }

    /// Collect index keys under `prefix`, newest (largest) first.
    fn index_keys_desc(&self, name: &str, prefix: &[u8]) -> Result<Vec<Box<[u8]>>> {
        let cf = self.cf(name)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward));

        let mut keys = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(db_err)?;
            if !key.starts_with(prefix) {
                break;
            }
            keys.push(key);
        }

        keys.reverse();
        Ok(keys)
    }
}

impl Store for RocksStore {
    type Tx<'a> = RocksTx<'a>;

    fn begin(&self) -> Result<RocksTx<'_>> {
        Ok(RocksTx {
            db: &self.db,
            txn: self.db.transaction(),
        })
    }

    // =========================================================================
    // Wallet Operations
    // =========================================================================

    fn create_wallet_if_absent(&self, account_id: AccountId) -> Result<Wallet> {
        let tx = self.begin()?;
        let cf = tx.cf(cf::WALLETS)?;
        let key = keys::wallet_key(account_id);

        if let Some(data) = tx.txn.get_for_update_cf(&cf, key, true).map_err(db_err)? {
            return deserialize(&data);
        }

        let wallet = Wallet::new(account_id);
        tx.txn.put_cf(&cf, key, serialize(&wallet)?).map_err(db_err)?;
        tx.commit()?;

        tracing::debug!(account_id = %account_id, "Created wallet");
        Ok(wallet)
    }

    fn get_wallet(&self, account_id: AccountId) -> Result<Option<Wallet>> {
        self.get(cf::WALLETS, &keys::wallet_key(account_id))
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    fn get_entry(&self, transaction_id: &TransactionId) -> Result<Option<LedgerEntry>> {
        self.get(cf::LEDGER, &keys::entry_key(transaction_id))
    }

    fn list_entries(
        &self,
        account_id: AccountId,
        filter: &EntryFilter,
        page: PageRequest,
    ) -> Result<(Vec<LedgerEntry>, u64)> {
        let prefix = keys::account_prefix(account_id);
        let mut entries = Vec::new();

        for key in self.index_keys_desc(cf::LEDGER_BY_ACCOUNT, &prefix)? {
            let Some(id) = keys::trailing_snowflake(&key) else {
                continue;
            };
            let id = TransactionId::from_snowflake(id);
            if let Some(entry) = self.get_entry(&id)? {
                if filter.matches(&entry) {
                    entries.push(entry);
                }
            }
        }

        Ok(page.slice(entries))
    }

    // =========================================================================
    // Recharge Order Operations
    // =========================================================================

    fn insert_order(&self, order: &RechargeOrder) -> Result<()> {
        let tx = self.begin()?;
        let cf_orders = tx.cf(cf::RECHARGE_ORDERS)?;
        let cf_by_account = tx.cf(cf::ORDERS_BY_ACCOUNT)?;
        let key = keys::order_key(&order.order_id);

        if tx
            .txn
            .get_for_update_cf(&cf_orders, key, true)
            .map_err(db_err)?
            .is_some()
        {
            return Err(StoreError::duplicate("order", order.order_id));
        }

        tx.txn
            .put_cf(&cf_orders, key, serialize(order)?)
            .map_err(db_err)?;
        tx.txn
            .put_cf(
                &cf_by_account,
                keys::account_order_key(order.account_id, &order.order_id),
                b"",
            )
            .map_err(db_err)?;
        tx.commit()
    }

    fn get_order(&self, order_id: &OrderId) -> Result<Option<RechargeOrder>> {
        self.get(cf::RECHARGE_ORDERS, &keys::order_key(order_id))
    }

    fn list_orders(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<(Vec<RechargeOrder>, u64)> {
        let mut orders = Vec::new();

        if let Some(account_id) = filter.account_id {
            let prefix = keys::account_prefix(account_id);
            for key in self.index_keys_desc(cf::ORDERS_BY_ACCOUNT, &prefix)? {
                let Some(id) = keys::trailing_snowflake(&key) else {
                    continue;
                };
                if let Some(order) = self.get_order(&OrderId::from_snowflake(id))? {
                    if filter.matches(&order) {
                        orders.push(order);
                    }
                }
            }
        } else {
            let cf = self.cf(cf::RECHARGE_ORDERS)?;
            for item in self.db.iterator_cf(&cf, IteratorMode::End) {
                let (_, value) = item.map_err(db_err)?;
                let order: RechargeOrder = deserialize(&value)?;
                if filter.matches(&order) {
                    orders.push(order);
                }
            }
        }

        Ok(page.slice(orders))
    }
}

/// Transaction over a [`RocksStore`]. Dropping it rolls back.
pub struct RocksTx<'a> {
    db: &'a Db,
    txn: Transaction<'a, Db>,
}

impl<'a> RocksTx<'a> {
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'a>>> {
        cf_handle(self.db, name)
    }

    fn get_for_update<T: serde::de::DeserializeOwned>(
        &self,
        name: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        let cf = self.cf(name)?;
        self.txn
            .get_for_update_cf(&cf, key, true)
            .map_err(db_err)?
            .map(|data| deserialize(&data))
            .transpose()
    }

    fn put<T: serde::Serialize>(&self, name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(name)?;
        self.txn.put_cf(&cf, key, serialize(value)?).map_err(db_err)
    }
}

impl StoreTx for RocksTx<'_> {
    fn get_order_for_update(&mut self, order_id: &OrderId) -> Result<Option<RechargeOrder>> {
        self.get_for_update(cf::RECHARGE_ORDERS, &keys::order_key(order_id))
    }

    fn conditional_adjust(&mut self, account_id: AccountId, delta: &BalanceDelta) -> Result<Adjusted> {
        let key = keys::wallet_key(account_id);
        let current: Wallet = self
            .get_for_update(cf::WALLETS, &key)?
            .ok_or_else(|| StoreError::not_found("wallet", account_id))?;

        let adjusted = adjust_row(&current, delta)?;
        self.put(cf::WALLETS, &key, &adjusted.after)?;
        Ok(adjusted)
    }

    fn append_entry(&mut self, entry: &LedgerEntry) -> Result<()> {
        let key = keys::entry_key(&entry.transaction_id);
        if self.get_for_update::<LedgerEntry>(cf::LEDGER, &key)?.is_some() {
            return Err(StoreError::duplicate("transaction", entry.transaction_id));
        }

        let wallet: Option<Wallet> =
            self.get_for_update(cf::WALLETS, &keys::wallet_key(entry.account_id))?;
        check_entry(entry, wallet.as_ref())?;

        self.put(cf::LEDGER, &key, entry)?;
        let cf_by_account = self.cf(cf::LEDGER_BY_ACCOUNT)?;
        self.txn
            .put_cf(
                &cf_by_account,
                keys::account_entry_key(entry.account_id, entry.created_at, &entry.transaction_id),
                b"",
            )
            .map_err(db_err)
    }

    fn update_order(&mut self, order: &RechargeOrder) -> Result<()> {
        let key = keys::order_key(&order.order_id);
        if self.get_for_update::<RechargeOrder>(cf::RECHARGE_ORDERS, &key)?.is_none() {
            return Err(StoreError::not_found("order", order.order_id));
        }
        self.put(cf::RECHARGE_ORDERS, &key, order)
    }

    fn commit(self) -> Result<()> {
        self.txn.commit().map_err(db_err)
    }
}

fn cf_handle<'a>(db: &'a Db, name: &str) -> Result<Arc<BoundColumnFamily<'a>>> {
    db.cf_handle(name)
        .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
}

#[allow(clippy::needless_pass_by_value)]
fn db_err(e: rocksdb::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

/// Serialize a value using CBOR.
fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

/// Deserialize a value from CBOR.
fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
    ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
}
