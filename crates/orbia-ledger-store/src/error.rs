//! Error types for ledger storage.

use orbia_ledger_core::{AccountId, LedgerError};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record (`wallet`, `order`, `transaction`).
        entity: &'static str,
        /// Its identifier.
        id: String,
    },

    /// The conditional adjust predicate failed; nothing was applied.
    #[error(
        "insufficient funds for account {account_id}: balance={balance_cents}, \
         frozen={frozen_balance_cents}, delta=({balance_delta}, {frozen_delta})"
    )]
    InsufficientFunds {
        /// Wallet owner.
        account_id: AccountId,
        /// Balance at the time of the check, in cents.
        balance_cents: i64,
        /// Frozen balance at the time of the check, in cents.
        frozen_balance_cents: i64,
        /// Requested balance change.
        balance_delta: i64,
        /// Requested frozen change.
        frozen_delta: i64,
    },

    /// A delta the wallet columns cannot represent (overflow, negative total).
    #[error("invalid adjustment for account {account_id}: {reason}")]
    InvalidAdjustment {
        /// Wallet owner.
        account_id: AccountId,
        /// What is wrong with the delta.
        reason: String,
    },

    /// A record with this key already exists.
    #[error("duplicate {entity}: {id}")]
    Duplicate {
        /// Kind of record.
        entity: &'static str,
        /// The colliding identifier.
        id: String,
    },

    /// A ledger entry was refused because its snapshots do not add up.
    #[error(transparent)]
    InconsistentEntry(#[from] LedgerError),
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn duplicate(entity: &'static str, id: impl ToString) -> Self {
        Self::Duplicate {
            entity,
            id: id.to_string(),
        }
    }
}
