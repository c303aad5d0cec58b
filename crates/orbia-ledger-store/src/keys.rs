//! Key encoding for the `RocksDB` column families.
//!
//! All integers are big-endian so lexicographic key order is numeric order
//! for non-negative values.

use chrono::{DateTime, Utc};
use orbia_ledger_core::{AccountId, OrderId, Snowflake, TransactionId};

/// Length of an account prefix.
pub const ACCOUNT_PREFIX_LEN: usize = 8;

/// Create a wallet key from an account ID.
#[must_use]
pub fn wallet_key(account_id: AccountId) -> [u8; 8] {
    account_id.as_i64().to_be_bytes()
}

/// Create a ledger key from a transaction ID.
#[must_use]
pub fn entry_key(transaction_id: &TransactionId) -> [u8; 8] {
    transaction_id.snowflake().to_be_bytes()
}

/// Create an order key from an order ID.
#[must_use]
pub fn order_key(order_id: &OrderId) -> [u8; 8] {
    order_id.snowflake().to_be_bytes()
}

/// Prefix shared by every index key of one account.
#[must_use]
pub fn account_prefix(account_id: AccountId) -> [u8; ACCOUNT_PREFIX_LEN] {
    wallet_key(account_id)
}

/// Create an account-entry index key.
///
/// Format: `account_id (8) || created_at micros (8) || transaction_id (8)`
#[must_use]
pub fn account_entry_key(
    account_id: AccountId,
    created_at: DateTime<Utc>,
    transaction_id: &TransactionId,
) -> Vec<u8> {
    let micros = u64::try_from(created_at.timestamp_micros()).unwrap_or(0);
    let mut key = Vec::with_capacity(24);
    key.extend_from_slice(&account_prefix(account_id));
    key.extend_from_slice(&micros.to_be_bytes());
    key.extend_from_slice(&entry_key(transaction_id));
    key
}

/// Create an account-order index key.
///
/// Format: `account_id (8) || order_id (8)`
#[must_use]
pub fn account_order_key(account_id: AccountId, order_id: &OrderId) -> Vec<u8> {
    let mut key = Vec::with_capacity(16);
    key.extend_from_slice(&account_prefix(account_id));
    key.extend_from_slice(&order_key(order_id));
    key
}

/// Read the generator ID from the last 8 bytes of an index key.
///
/// Returns `None` if the key is too short to hold one.
#[must_use]
pub fn trailing_snowflake(key: &[u8]) -> Option<Snowflake> {
    let start = key.len().checked_sub(8)?;
    let bytes: [u8; 8] = key[start..].try_into().ok()?;
    Some(Snowflake::from_i64(i64::from_be_bytes(bytes)))
}
