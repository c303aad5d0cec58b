//! Consumption (debit) workflow.
//!
//! The conditional adjust's predicate is the only sufficiency check. A
//! balance shown to the caller beforehand is display-only.

use orbia_ledger_core::{ensure_positive, AccountId, BalanceDelta, LedgerEntry, TransactionId};
use orbia_ledger_store::{Store, StoreTx};

use crate::error::{Result, ServiceError};
use crate::state::Ledger;

/// Input for a debit.
#[derive(Debug, Clone)]
pub struct DebitRequest {
    /// Account to charge.
    pub account_id: AccountId,
    /// Amount in cents.
    pub amount_cents: i64,
    /// Kind of record being paid for (e.g. `campaign`).
    pub related_order_type: Option<String>,
    /// ID of that record.
    pub related_order_id: Option<String>,
    /// Free-form reason.
    pub remark: Option<String>,
}

impl<S: Store> Ledger<S> {
    /// Deduct `amount_cents` and record a completed consume entry.
    ///
    /// # Errors
    ///
    /// - `ServiceError::InvalidInput` if the amount is not positive.
    /// - `ServiceError::NotFound` if the account has no wallet.
    /// - `ServiceError::InsufficientFunds` if the balance cannot cover it;
    ///   nothing is written in that case.
    /// - `ServiceError::AtomicUnit` if a storage step fails.
    pub fn debit(&self, request: DebitRequest) -> Result<LedgerEntry> {
        let amount_cents = ensure_positive(request.amount_cents)?;
        let account_id = request.account_id;

        let mut tx = self.store.begin()?;
        let adjusted = match tx.conditional_adjust(account_id, &BalanceDelta::consume(amount_cents)) {
            Ok(adjusted) => adjusted,
            Err(e) => {
                let err = ServiceError::in_step("debit_wallet", e);
                if let ServiceError::InsufficientFunds { balance_cents, .. } = &err {
                    tracing::warn!(
                        account_id = %account_id,
                        amount_cents,
                        balance_cents,
                        "Debit rejected: insufficient funds"
                    );
                }
                return Err(err);
            }
        };

        let transaction_id =
            TransactionId::issue(&self.ids).map_err(|e| ServiceError::in_step("issue_id", e))?;
        let mut entry = LedgerEntry::completed_consume(
            transaction_id,
            amount_cents,
            &adjusted.before,
            &adjusted.after,
        )
        .with_remark(request.remark);
        entry.related_order_type = request.related_order_type;
        entry.related_order_id = request.related_order_id;

        tx.append_entry(&entry)
            .map_err(|e| ServiceError::in_step("append_entry", e))?;
        tx.commit().map_err(|e| ServiceError::in_step("commit", e))?;

        tracing::info!(
            account_id = %account_id,
            transaction_id = %entry.transaction_id,
            amount_cents,
            balance_after_cents = entry.balance_after_cents,
            related_order_id = ?entry.related_order_id,
            "Wallet debited"
        );
        Ok(entry)
    }
}
