//! Domain error types for the wallet ledger.

use crate::ids::IdError;
use crate::order::OrderStatus;

/// Result type for ledger domain operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors raised by domain rules (amounts, order transitions, entry invariants).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Amount is zero, negative, or not a valid decimal.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Illegal recharge order transition.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state.
        from: OrderStatus,
        /// Requested state.
        to: OrderStatus,
    },

    /// A ledger entry violates its balance snapshot invariant.
    #[error("inconsistent ledger entry {transaction_id}: {reason}")]
    InconsistentEntry {
        /// The offending entry.
        transaction_id: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A required field was missing or empty.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A field holds a value outside its allowed set.
    #[error("invalid {field}: {value:?}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}
