//! Recharge order workflow.
//!
//! Orders are created `pending` and resolved exactly once. Confirmation runs
//! as one store transaction:
//!
//! 1. lock the order and check it is still `pending`
//! 2. credit the wallet through the conditional adjust
//! 3. append a completed recharge entry with the adjust's snapshots
//! 4. mark the order `confirmed`
//!
//! Any failure drops the transaction, leaving the order pending and the wallet
//! untouched.

use chrono::Utc;
use serde::Serialize;

use orbia_ledger_core::{
    ensure_positive, AccountId, Actor, BalanceDelta, ConfirmProof, CryptoOrderDraft, LedgerEntry,
    OrderFilter, OrderId, OrderStatus, Page, PageRequest, RechargeOrder, TransactionId,
};
use orbia_ledger_store::{Store, StoreTx};

use crate::error::{Result, ServiceError};
use crate::state::Ledger;

/// `related_order_type` recorded on recharge entries.
pub const RECHARGE_ORDER_KIND: &str = "recharge_order";

/// Input for a crypto recharge order.
#[derive(Debug, Clone)]
pub struct CryptoOrderRequest {
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

/// A freshly created online order.
#[derive(Debug, Clone, Serialize)]
pub struct OnlineOrderCreated {
    /// The pending order.
    pub order: RechargeOrder,
    /// Where to send the payer. Empty until a payment platform is integrated.
    pub payment_url: String,
}

/// Result of a successful confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmedRecharge {
    /// The confirmed order.
    pub order: RechargeOrder,
    /// The ledger entry that credited the wallet.
    pub entry: LedgerEntry,
}

impl<S: Store> Ledger<S> {
    // =========================================================================
    // Creation
    // =========================================================================

    /// Create a pending crypto order, snapshotting the payment destination.
    ///
    /// # Errors
    ///
    /// - `ServiceError::InvalidInput` for a non-positive amount, a blank payer
    ///   address or an inactive payment setting.
    /// - `ServiceError::NotFound` if the payment setting does not exist.
    pub fn create_crypto_order(&self, request: CryptoOrderRequest) -> Result<RechargeOrder> {
        ensure_positive(request.amount_cents)?;
        if request.payer_crypto_address.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "payer crypto address is required".into(),
            ));
        }

        let setting = self
            .payment_settings
            .find(request.payment_setting_id)
            .ok_or_else(|| ServiceError::not_found("payment_setting", request.payment_setting_id))?;
        if !setting.active {
            return Err(ServiceError::InvalidInput(format!(
                "payment setting {} is not active",
                setting.id
            )));
        }

        let order = RechargeOrder::crypto(
            OrderId::issue(&self.ids)?,
            CryptoOrderDraft {
                account_id: request.account_id,
                amount_cents: request.amount_cents,
                payment_setting_id: setting.id,
                payer_crypto_address: request.payer_crypto_address,
                crypto_tx_hash: request.crypto_tx_hash,
                remark: request.remark,
            },
            setting.destination(),
        );
        self.store.insert_order(&order)?;

        tracing::info!(
            order_id = %order.order_id,
            account_id = %order.account_id,
            amount_cents = order.amount_cents,
            network = %setting.network,
            "Crypto recharge order created"
        );
        Ok(order)
    }

    /// Create a pending online-payment order.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` for a non-positive amount or a
    /// blank platform.
    pub fn create_online_order(
        &self,
        account_id: AccountId,
        amount_cents: i64,
        platform: &str,
    ) -> Result<OnlineOrderCreated> {
        ensure_positive(amount_cents)?;
        let platform = platform.trim();
        if platform.is_empty() {
            return Err(ServiceError::InvalidInput("payment platform is required".into()));
        }

        let order = RechargeOrder::online(
            OrderId::issue(&self.ids)?,
            account_id,
            amount_cents,
            platform.to_string(),
        );
        self.store.insert_order(&order)?;

        tracing::info!(
            order_id = %order.order_id,
            account_id = %account_id,
            amount_cents,
            platform,
            "Online recharge order created"
        );
        Ok(OnlineOrderCreated {
            order,
            payment_url: String::new(),
        })
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Confirm a pending order and credit the wallet, all or nothing.
    ///
    /// # Errors
    ///
    /// - `ServiceError::NotFound` if the order does not exist.
    /// - `ServiceError::InvalidStateTransition` if it is no longer pending.
    /// - `ServiceError::AtomicUnit` if a storage step fails.
    pub fn confirm(
        &self,
        order_id: &OrderId,
        actor: Actor,
        proof: ConfirmProof,
    ) -> Result<ConfirmedRecharge> {
        let account_id = self
            .store
            .get_order(order_id)?
            .ok_or_else(|| ServiceError::not_found("order", order_id))?
            .account_id;
        self.store.create_wallet_if_absent(account_id)?;

        let mut tx = self.store.begin()?;

        let mut order = tx
            .get_order_for_update(order_id)
            .map_err(|e| ServiceError::in_step("lock_order", e))?
            .ok_or_else(|| ServiceError::not_found("order", order_id))?;
        if let Err(e) = order.confirm(actor.clone(), proof, Utc::now()) {
            tracing::warn!(order_id = %order_id, status = %order.status, "Confirm rejected");
            return Err(e.into());
        }

        let adjusted = tx
            .conditional_adjust(account_id, &BalanceDelta::recharge(order.amount_cents))
            .map_err(|e| ServiceError::in_step("credit_wallet", e))?;

        let transaction_id =
            TransactionId::issue(&self.ids).map_err(|e| ServiceError::in_step("issue_id", e))?;
        let entry = LedgerEntry::completed_recharge(
            transaction_id,
            order.amount_cents,
            &adjusted.before,
            &adjusted.after,
        )
        .with_payment(order.payment_type.as_str(), order.crypto_tx_hash.clone())
        .with_related_order(RECHARGE_ORDER_KIND, order.order_id.to_string());

        tx.append_entry(&entry)
            .map_err(|e| ServiceError::in_step("append_entry", e))?;
        tx.update_order(&order)
            .map_err(|e| ServiceError::in_step("update_order", e))?;
        tx.commit().map_err(|e| ServiceError::in_step("commit", e))?;

        tracing::info!(
            order_id = %order.order_id,
            account_id = %account_id,
            transaction_id = %entry.transaction_id,
            amount_cents = order.amount_cents,
            balance_after_cents = entry.balance_after_cents,
            actor = %actor,
            "Recharge order confirmed"
        );
        Ok(ConfirmedRecharge { order, entry })
    }

    /// Reject a pending order. No wallet mutation, no ledger entry.
    ///
    /// # Errors
    ///
    /// - `ServiceError::InvalidInput` if `reason` is blank.
    /// - `ServiceError::NotFound` if the order does not exist.
    /// - `ServiceError::InvalidStateTransition` if it is no longer pending.
    pub fn reject(&self, order_id: &OrderId, actor: Actor, reason: &str) -> Result<RechargeOrder> {
        if reason.trim().is_empty() {
            return Err(ServiceError::InvalidInput("reject reason is required".into()));
        }

        let mut tx = self.store.begin()?;
        let mut order = tx
            .get_order_for_update(order_id)
            .map_err(|e| ServiceError::in_step("lock_order", e))?
            .ok_or_else(|| ServiceError::not_found("order", order_id))?;

        if let Err(e) = order.reject(actor.clone(), reason, Utc::now()) {
            tracing::warn!(order_id = %order_id, status = %order.status, "Reject refused");
            return Err(e.into());
        }

        tx.update_order(&order)
            .map_err(|e| ServiceError::in_step("update_order", e))?;
        tx.commit().map_err(|e| ServiceError::in_step("commit", e))?;

        tracing::info!(
            order_id = %order_id,
            account_id = %order.account_id,
            actor = %actor,
            reason = reason.trim(),
            "Recharge order rejected"
        );
        Ok(order)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The requester's own orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn my_orders(
        &self,
        account_id: AccountId,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<RechargeOrder>> {
        self.all_orders(
            &OrderFilter {
                account_id: Some(account_id),
                status,
                payment_type: None,
            },
            page,
        )
    }

    /// Orders across all accounts, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn all_orders(&self, filter: &OrderFilter, page: PageRequest) -> Result<Page<RechargeOrder>> {
        let (orders, total) = self.store.list_orders(filter, page)?;
        tracing::debug!(?filter, total, "Orders listed");
        Ok(Page::new(orders, page, total))
    }

    /// One order, visible to its owner or an admin.
    ///
    /// # Errors
    ///
    /// - `ServiceError::NotFound` if the order does not exist.
    /// - `ServiceError::PermissionDenied` if the requester is neither.
    pub fn order_detail(
        &self,
        requester: AccountId,
        order_id: &OrderId,
        is_admin: bool,
    ) -> Result<RechargeOrder> {
        let order = self
            .store
            .get_order(order_id)?
            .ok_or_else(|| ServiceError::not_found("order", order_id))?;

        if !is_admin && order.account_id != requester {
            tracing::warn!(requester = %requester, order_id = %order_id, "Order detail denied");
            return Err(ServiceError::PermissionDenied(
                "order belongs to another account".into(),
            ));
        }

        Ok(order)
    }
}
