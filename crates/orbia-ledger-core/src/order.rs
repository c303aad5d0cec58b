//! Recharge orders.
//!
//! A recharge order tracks an external payment through
//! `pending -> confirmed | failed`. Both targets are terminal.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::{AccountId, OrderId};

/// Who resolved an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Actor {
    /// An administrator account.
    Admin(AccountId),

    /// An automated component, e.g. a payment-platform callback.
    System(String),
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin(id) => write!(f, "admin:{id}"),
            Self::System(name) => write!(f, "system:{name}"),
        }
    }
}

/// Payment destination copied from the payment settings at creation time.
///
/// Later edits to the settings never reach an order already in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDestination {
    /// Chain / network name (e.g. `TRC20`).
    pub network: String,
    /// Receiving address.
    pub address: String,
    /// Display label.
    pub label: String,
}

/// How an order is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// On-chain transfer to a configured address.
    Crypto,

    /// Third-party online payment platform.
    Online,
}

impl PaymentType {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Crypto => "crypto",
            Self::Online => "online",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "crypto" => Ok(Self::Crypto),
            "online" => Ok(Self::Online),
            _ => Err(LedgerError::InvalidField {
                field: "payment_type",
                value: s.to_string(),
            }),
        }
    }
}

/// Recharge order states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Awaiting payment confirmation.
    Pending,

    /// Payment confirmed and wallet credited.
    Confirmed,

    /// Payment rejected; wallet untouched.
    Failed,
}

impl OrderStatus {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        }
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }

    /// Validate `self -> to`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidStateTransition` naming the illegal pair.
    pub fn transition(self, to: Self) -> Result<Self> {
        match (self, to) {
            (Self::Pending, Self::Confirmed | Self::Failed) => Ok(to),
            (from, to) => Err(LedgerError::InvalidStateTransition { from, to }),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "failed" => Ok(Self::Failed),
            _ => Err(LedgerError::InvalidField {
                field: "status",
                value: s.to_string(),
            }),
        }
    }
}

/// A recharge order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RechargeOrder {
    /// External order ID.
    pub order_id: OrderId,

    /// Account to credit.
    pub account_id: AccountId,

    /// Amount in cents.
    pub amount_cents: i64,

    /// Payment channel.
    pub payment_type: PaymentType,

    /// Payment setting the destination was copied from (crypto only).
    pub payment_setting_id: Option<i64>,

    /// Destination snapshot (crypto only).
    pub destination: Option<PaymentDestination>,

    /// Payer's sending address (crypto only).
    pub payer_crypto_address: Option<String>,

    /// On-chain transaction hash, from the payer or the confirming actor.
    pub crypto_tx_hash: Option<String>,

    /// Payment platform (online only).
    pub online_payment_platform: Option<String>,

    /// Current state.
    pub status: OrderStatus,

    /// Payer remark, with admin remarks appended on confirmation.
    pub remark: Option<String>,

    /// Who confirmed the order.
    pub confirmed_by: Option<Actor>,

    /// When the order was confirmed.
    pub confirmed_at: Option<DateTime<Utc>>,

    /// Who rejected the order.
    pub failed_by: Option<Actor>,

    /// Why the order was rejected.
    pub failed_reason: Option<String>,

    /// When the order was created.
    pub created_at: DateTime<Utc>,

    /// When the order was last changed.
    pub updated_at: DateTime<Utc>,
}

/// Inputs for a crypto recharge order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoOrderDraft {
    /// Account to credit.
    pub account_id: AccountId,
    /// Amount in cents.
    pub amount_cents: i64,
    /// Payment setting chosen by the payer.
    pub payment_setting_id: i64,
    /// Payer's sending address.
    pub payer_crypto_address: String,
    /// Transaction hash, if the payer already has one.
    pub crypto_tx_hash: Option<String>,
    /// Payer remark.
    pub remark: Option<String>,
}

/// Evidence supplied when confirming an order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmProof {
    /// On-chain transaction hash; replaces the payer-supplied one when set.
    pub crypto_tx_hash: Option<String>,
    /// Admin remark appended to the order remark.
    pub remark: Option<String>,
}

impl RechargeOrder {
    /// A pending crypto order with its destination snapshot.
    #[must_use]
    pub fn crypto(order_id: OrderId, draft: CryptoOrderDraft, destination: PaymentDestination) -> Self {
        let mut order = Self::pending(order_id, draft.account_id, draft.amount_cents, PaymentType::Crypto);
        order.payment_setting_id = Some(draft.payment_setting_id);
        order.destination = Some(destination);
        order.payer_crypto_address = Some(draft.payer_crypto_address);
        order.crypto_tx_hash = non_empty(draft.crypto_tx_hash);
        order.remark = non_empty(draft.remark);
        order
    }

    /// A pending online-payment order.
    #[must_use]
    pub fn online(order_id: OrderId, account_id: AccountId, amount_cents: i64, platform: String) -> Self {
        let mut order = Self::pending(order_id, account_id, amount_cents, PaymentType::Online);
        order.online_payment_platform = Some(platform);
        order
    }

    fn pending(order_id: OrderId, account_id: AccountId, amount_cents: i64, payment_type: PaymentType) -> Self {
        let now = Utc::now();
        Self {
            order_id,
            account_id,
            amount_cents,
            payment_type,
            payment_setting_id: None,
            destination: None,
            payer_crypto_address: None,
            crypto_tx_hash: None,
            online_payment_platform: None,
            status: OrderStatus::Pending,
            remark: None,
            confirmed_by: None,
            confirmed_at: None,
            failed_by: None,
            failed_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `confirmed`, recording the actor and proof.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidStateTransition` unless the order is pending.
    pub fn confirm(&mut self, actor: Actor, proof: ConfirmProof, now: DateTime<Utc>) -> Result<()> {
        self.status = self.status.transition(OrderStatus::Confirmed)?;
        self.confirmed_by = Some(actor);
        self.confirmed_at = Some(now);
        self.updated_at = now;

        if let Some(hash) = non_empty(proof.crypto_tx_hash) {
            self.crypto_tx_hash = Some(hash);
        }
        if let Some(remark) = non_empty(proof.remark) {
            self.remark = Some(merge_admin_remark(self.remark.as_deref(), &remark));
        }

        Ok(())
    }

    /// Move to `failed` with a mandatory reason.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::MissingField` for a blank reason and
    /// `LedgerError::InvalidStateTransition` unless the order is pending.
    pub fn reject(&mut self, actor: Actor, reason: &str, now: DateTime<Utc>) -> Result<()> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LedgerError::MissingField("failed_reason"));
        }

        self.status = self.status.transition(OrderStatus::Failed)?;
        self.failed_by = Some(actor);
        self.failed_reason = Some(reason.to_string());
        self.updated_at = now;
        Ok(())
    }
}

/// Append an admin remark to the payer's remark.
#[must_use]
pub fn merge_admin_remark(existing: Option<&str>, remark: &str) -> String {
    match existing {
        Some(existing) if !existing.is_empty() => format!("{existing}\n[Admin]: {remark}"),
        _ => format!("[Admin]: {remark}"),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Filter for order listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFilter {
    /// Only orders of this account.
    pub account_id: Option<AccountId>,
    /// Only orders in this state.
    pub status: Option<OrderStatus>,
    /// Only orders paid this way.
    pub payment_type: Option<PaymentType>,
}

impl OrderFilter {
    /// Whether `order` passes the filter.
    #[must_use]
    pub fn matches(&self, order: &RechargeOrder) -> bool {
        self.account_id.map_or(true, |a| a == order.account_id)
            && self.status.map_or(true, |s| s == order.status)
            && self.payment_type.map_or(true, |p| p == order.payment_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IdGenerator;

    fn order_id() -> OrderId {
        OrderId::issue(&IdGenerator::new(1).unwrap()).unwrap()
    }

    fn destination() -> PaymentDestination {
        PaymentDestination {
            network: "TRC20".into(),
            address: "TXYZ-treasury".into(),
            label: "Main treasury".into(),
        }
    }

    fn crypto_order() -> RechargeOrder {
        RechargeOrder::crypto(
            order_id(),
            CryptoOrderDraft {
                account_id: AccountId::new(42),
                amount_cents: 10_000,
                payment_setting_id: 3,
                payer_crypto_address: "TPayer".into(),
                crypto_tx_hash: Some(String::new()),
                remark: Some("first top-up".into()),
            },
            destination(),
        )
    }

    #[test]
    fn only_pending_transitions_are_legal() {
        use OrderStatus::{Confirmed, Failed, Pending};

        assert_eq!(Pending.transition(Confirmed), Ok(Confirmed));
        assert_eq!(Pending.transition(Failed), Ok(Failed));
        for (from, to) in [
            (Pending, Pending),
            (Confirmed, Failed),
            (Confirmed, Confirmed),
            (Failed, Confirmed),
            (Failed, Pending),
        ] {
            assert_eq!(
                from.transition(to),
                Err(LedgerError::InvalidStateTransition { from, to })
            );
        }
    }

    #[test]
    fn crypto_order_snapshots_destination() {
        let order = crypto_order();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_type, PaymentType::Crypto);
        assert_eq!(order.destination, Some(destination()));
        assert_eq!(order.crypto_tx_hash, None, "blank hash is dropped");
        assert!(order.order_id.to_string().starts_with("RCHORD_"));
    }

    #[test]
    fn confirm_records_actor_and_merges_remark() {
        let mut order = crypto_order();
        let now = Utc::now();
        order
            .confirm(
                Actor::Admin(AccountId::new(1)),
                ConfirmProof {
                    crypto_tx_hash: Some("0xabc".into()),
                    remark: Some("verified on chain".into()),
                },
                now,
            )
            .unwrap();

        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.confirmed_by, Some(Actor::Admin(AccountId::new(1))));
        assert_eq!(order.confirmed_at, Some(now));
        assert_eq!(order.crypto_tx_hash.as_deref(), Some("0xabc"));
        assert_eq!(
            order.remark.as_deref(),
            Some("first top-up\n[Admin]: verified on chain")
        );
    }

    #[test]
    fn terminal_order_cannot_be_confirmed_again() {
        let mut order = crypto_order();
        order
            .confirm(Actor::System("test".into()), ConfirmProof::default(), Utc::now())
            .unwrap();
        let snapshot = order.clone();

        let err = order
            .confirm(Actor::System("test".into()), ConfirmProof::default(), Utc::now())
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidStateTransition {
                from: OrderStatus::Confirmed,
                to: OrderStatus::Confirmed
            }
        );
        assert_eq!(order, snapshot, "failed transition leaves order untouched");
    }

    #[test]
    fn reject_requires_reason() {
        let mut order = RechargeOrder::online(order_id(), AccountId::new(7), 500, "stripe".into());
        assert_eq!(
            order.reject(Actor::Admin(AccountId::new(1)), "  ", Utc::now()),
            Err(LedgerError::MissingField("failed_reason"))
        );
        assert_eq!(order.status, OrderStatus::Pending);

        order
            .reject(Actor::Admin(AccountId::new(1)), "payment not received", Utc::now())
            .unwrap();
        assert_eq!(order.status, OrderStatus::Failed);
        assert_eq!(order.failed_reason.as_deref(), Some("payment not received"));
    }

    #[test]
    fn admin_remark_without_existing() {
        assert_eq!(merge_admin_remark(None, "ok"), "[Admin]: ok");
        assert_eq!(merge_admin_remark(Some(""), "ok"), "[Admin]: ok");
    }

    #[test]
    fn filter_combines_fields() {
        let order = crypto_order();
        assert!(OrderFilter::default().matches(&order));
        assert!(OrderFilter {
            account_id: Some(AccountId::new(42)),
            status: Some(OrderStatus::Pending),
            payment_type: Some(PaymentType::Crypto),
        }
        .matches(&order));
        assert!(!OrderFilter {
            payment_type: Some(PaymentType::Online),
            ..OrderFilter::default()
        }
        .matches(&order));
    }

    #[test]
    fn actor_serializes_tagged() {
        let json = serde_json::to_value(Actor::Admin(AccountId::new(9))).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "admin", "id": 9}));
    }
}
