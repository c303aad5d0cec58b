//! Ledger entry types.
//!
//! Every balance change writes exactly one [`LedgerEntry`] in the same store
//! transaction as the wallet update. Entries are append-only.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::{AccountId, TransactionId, Wallet};

/// An immutable record of one balance change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique, generator-derived transaction ID.
    pub transaction_id: TransactionId,

    /// The account whose wallet changed.
    pub account_id: AccountId,

    /// Direction of the change.
    #[serde(rename = "type")]
    pub entry_type: EntryType,

    /// Amount in cents. Always positive; the sign comes from `entry_type`.
    pub amount_cents: i64,

    /// Wallet balance immediately before the change.
    pub balance_before_cents: i64,

    /// Wallet balance immediately after the change.
    pub balance_after_cents: i64,

    /// Entry status.
    pub status: EntryStatus,

    /// Payment method for recharges (`crypto`, `online`).
    pub payment_method: Option<String>,

    /// On-chain transaction hash backing a crypto recharge.
    pub crypto_tx_hash: Option<String>,

    /// Kind of external record this entry belongs to (`recharge_order`, `campaign`).
    pub related_order_type: Option<String>,

    /// ID of the external record.
    pub related_order_id: Option<String>,

    /// Free-form note.
    pub remark: Option<String>,

    /// When the entry was written.
    pub created_at: DateTime<Utc>,

    /// When the entry reached `completed`.
    pub completed_at: Option<DateTime<Utc>>,
}

impl LedgerEntry {
    /// A completed recharge, snapshotting the wallet rows around the update.
    #[must_use]
    pub fn completed_recharge(
        transaction_id: TransactionId,
        amount_cents: i64,
        before: &Wallet,
        after: &Wallet,
    ) -> Self {
        Self::completed(transaction_id, EntryType::Recharge, amount_cents, before, after)
    }

    /// A completed consumption, snapshotting the wallet rows around the update.
    #[must_use]
    pub fn completed_consume(
        transaction_id: TransactionId,
        amount_cents: i64,
        before: &Wallet,
        after: &Wallet,
    ) -> Self {
        Self::completed(transaction_id, EntryType::Consume, amount_cents, before, after)
    }

    fn completed(
        transaction_id: TransactionId,
        entry_type: EntryType,
        amount_cents: i64,
        before: &Wallet,
        after: &Wallet,
    ) -> Self {
        let now = Utc::now();
        Self {
            transaction_id,
            account_id: after.account_id,
            entry_type,
            amount_cents,
            balance_before_cents: before.balance_cents,
            balance_after_cents: after.balance_cents,
            status: EntryStatus::Completed,
            payment_method: None,
            crypto_tx_hash: None,
            related_order_type: None,
            related_order_id: None,
            remark: None,
            created_at: now,
            completed_at: Some(now),
        }
    }

    /// Link the entry to an external record.
    #[must_use]
    pub fn with_related_order(mut self, kind: impl Into<String>, id: impl Into<String>) -> Self {
        self.related_order_type = Some(kind.into());
        self.related_order_id = Some(id.into());
        self
    }

    /// Record how a recharge was paid.
    #[must_use]
    pub fn with_payment(mut self, method: impl Into<String>, tx_hash: Option<String>) -> Self {
        self.payment_method = Some(method.into());
        self.crypto_tx_hash = tx_hash;
        self
    }

    /// Attach a remark.
    #[must_use]
    pub fn with_remark(mut self, remark: Option<String>) -> Self {
        self.remark = remark;
        self
    }

    /// Amount with sign: positive for credits, negative for debits.
    #[must_use]
    pub const fn signed_amount(&self) -> i64 {
        match self.entry_type {
            EntryType::Recharge => self.amount_cents,
            EntryType::Consume => -self.amount_cents,
        }
    }

    /// Check the snapshot invariant.
    ///
    /// The amount must be positive, snapshots non-negative, and for a
    /// completed entry `balance_after = balance_before ± amount`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InconsistentEntry` describing the violation.
    pub fn check_consistency(&self) -> Result<()> {
        let fail = |reason: String| {
            Err(LedgerError::InconsistentEntry {
                transaction_id: self.transaction_id.to_string(),
                reason,
            })
        };

        if self.amount_cents <= 0 {
            return fail(format!("amount must be positive, got {}", self.amount_cents));
        }
        if self.balance_before_cents < 0 || self.balance_after_cents < 0 {
            return fail("balance snapshots must not be negative".into());
        }

        if self.status == EntryStatus::Completed {
            let expected = self.balance_before_cents.checked_add(self.signed_amount());
            if expected != Some(self.balance_after_cents) {
                return fail(format!(
                    "{} of {} from {} cannot end at {}",
                    self.entry_type,
                    self.amount_cents,
                    self.balance_before_cents,
                    self.balance_after_cents
                ));
            }
            if self.completed_at.is_none() {
                return fail("completed entry has no completion time".into());
            }
        }

        Ok(())
    }
}

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Funds added to the wallet.
    Recharge,

    /// Funds deducted from the wallet.
    Consume,
}

impl EntryType {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recharge => "recharge",
            Self::Consume => "consume",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "recharge" => Ok(Self::Recharge),
            "consume" => Ok(Self::Consume),
            _ => Err(LedgerError::InvalidField {
                field: "type",
                value: s.to_string(),
            }),
        }
    }
}

/// Lifecycle of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Written, awaiting settlement.
    Pending,

    /// Settled; the balance change is final.
    Completed,

    /// Settlement failed; no balance change.
    Failed,
}

impl EntryStatus {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(LedgerError::InvalidField {
                field: "status",
                value: s.to_string(),
            }),
        }
    }
}

/// Filter for listing an account's entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFilter {
    /// Only entries of this type.
    pub entry_type: Option<EntryType>,
    /// Only entries in this status.
    pub status: Option<EntryStatus>,
}

impl EntryFilter {
    /// Whether `entry` passes the filter.
    #[must_use]
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.entry_type.map_or(true, |t| t == entry.entry_type)
            && self.status.map_or(true, |s| s == entry.status)
    }
}
