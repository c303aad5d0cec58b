//! Wallet balance records.
//!
//! A wallet is created lazily per account and only ever mutated through a
//! conditional [`BalanceDelta`] application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AccountId;

/// The balance record of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// The owning account.
    pub account_id: AccountId,

    /// Available funds in cents. Never negative.
    pub balance_cents: i64,

    /// Funds earmarked but not yet settled, in cents. Never negative.
    pub frozen_balance_cents: i64,

    /// Lifetime sum of completed recharges (in cents).
    pub total_recharge_cents: i64,

    /// Lifetime sum of completed debits (in cents).
    pub total_consume_cents: i64,

    /// When the wallet was created.
    pub created_at: DateTime<Utc>,

    /// When the wallet was last adjusted.
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Create a new wallet with zero balances.
    #[must_use]
    pub fn new(account_id: AccountId) -> Self {
        let now = Utc::now();
        Self {
            account_id,
            balance_cents: 0,
            frozen_balance_cents: 0,
            total_recharge_cents: 0,
            total_consume_cents: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Evaluate the conditional-update predicate and produce the resulting row.
    ///
    /// Returns `None` when `balance + balance_delta < 0`,
    /// `frozen_balance + frozen_delta < 0`, a lifetime-total increment is
    /// negative, or any column would overflow. Storage backends call this while
    /// holding the row so the check and the write are one atomic step.
    #[must_use]
    pub fn apply(&self, delta: &BalanceDelta, now: DateTime<Utc>) -> Option<Self> {
        if delta.recharge_cents < 0 || delta.consume_cents < 0 {
            return None;
        }

        let balance = self.balance_cents.checked_add(delta.balance_cents)?;
        let frozen = self.frozen_balance_cents.checked_add(delta.frozen_cents)?;
        if balance < 0 || frozen < 0 {
            return None;
        }

        Some(Self {
            account_id: self.account_id,
            balance_cents: balance,
            frozen_balance_cents: frozen,
            total_recharge_cents: self.total_recharge_cents.checked_add(delta.recharge_cents)?,
            total_consume_cents: self.total_consume_cents.checked_add(delta.consume_cents)?,
            created_at: self.created_at,
            updated_at: now,
        })
    }
}

/// Deltas applied by one conditional adjust.
///
/// `balance_cents` and `frozen_cents` are signed; the lifetime totals only
/// ever grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDelta {
    /// Change to the available balance.
    pub balance_cents: i64,
    /// Change to the frozen balance.
    pub frozen_cents: i64,
    /// Increment of `total_recharge`.
    pub recharge_cents: i64,
    /// Increment of `total_consume`.
    pub consume_cents: i64,
}

impl BalanceDelta {
    /// Raw balance/frozen deltas with no lifetime-total bookkeeping.
    #[must_use]
    pub const fn new(balance_cents: i64, frozen_cents: i64) -> Self {
        Self {
            balance_cents,
            frozen_cents,
            recharge_cents: 0,
            consume_cents: 0,
        }
    }

    /// Credit a completed recharge.
    #[must_use]
    pub const fn recharge(amount_cents: i64) -> Self {
        Self {
            balance_cents: amount_cents,
            frozen_cents: 0,
            recharge_cents: amount_cents,
            consume_cents: 0,
        }
    }

    /// Debit a completed consumption.
    #[must_use]
    pub const fn consume(amount_cents: i64) -> Self {
        Self {
            balance_cents: -amount_cents,
            frozen_cents: 0,
            recharge_cents: 0,
            consume_cents: amount_cents,
        }
    }

    /// Move funds from available to frozen.
    #[must_use]
    pub const fn freeze(amount_cents: i64) -> Self {
        Self::new(-amount_cents, amount_cents)
    }

    /// Move funds from frozen back to available.
    #[must_use]
    pub const fn unfreeze(amount_cents: i64) -> Self {
        Self::new(amount_cents, -amount_cents)
    }
}
