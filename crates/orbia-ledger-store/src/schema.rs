//! Column families used by the `RocksDB` backend.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Wallet rows, keyed by `account_id`.
    pub const WALLETS: &str = "wallets";

    /// Ledger entries, keyed by the transaction's generator ID.
    pub const LEDGER: &str = "ledger";

    /// Index: entries by account, keyed by `account_id || created_at || id`.
    /// Value is empty (index only).
    pub const LEDGER_BY_ACCOUNT: &str = "ledger_by_account";

    /// Recharge orders, keyed by the order's generator ID.
    pub const RECHARGE_ORDERS: &str = "recharge_orders";

    /// Index: orders by account, keyed by `account_id || id`.
    /// Value is empty (index only).
    pub const ORDERS_BY_ACCOUNT: &str = "orders_by_account";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::WALLETS,
        cf::LEDGER,
        cf::LEDGER_BY_ACCOUNT,
        cf::RECHARGE_ORDERS,
        cf::ORDERS_BY_ACCOUNT,
    ]
}
