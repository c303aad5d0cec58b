//! Wallet reads and transaction history.

use serde::Serialize;

use orbia_ledger_core::{
    format_amount, AccountId, EntryFilter, LedgerEntry, Page, PageRequest, TransactionId, Wallet,
};
use orbia_ledger_store::Store;

use crate::error::{Result, ServiceError};
use crate::state::Ledger;

/// Wallet summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletInfo {
    /// The owning account.
    pub account_id: AccountId,
    /// Available balance in cents.
    pub balance_cents: i64,
    /// Frozen balance in cents.
    pub frozen_balance_cents: i64,
    /// Lifetime recharges in cents.
    pub total_recharge_cents: i64,
    /// Lifetime consumption in cents.
    pub total_consume_cents: i64,
    /// Balance formatted with two decimals.
    pub balance_formatted: String,
}

impl From<&Wallet> for WalletInfo {
    fn from(wallet: &Wallet) -> Self {
        Self {
            account_id: wallet.account_id,
            balance_cents: wallet.balance_cents,
            frozen_balance_cents: wallet.frozen_balance_cents,
            total_recharge_cents: wallet.total_recharge_cents,
            total_consume_cents: wallet.total_consume_cents,
            balance_formatted: format_amount(wallet.balance_cents),
        }
    }
}

impl<S: Store> Ledger<S> {
    /// Create the account's wallet unless it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn ensure_wallet(&self, account_id: AccountId) -> Result<Wallet> {
        let wallet = self.store.create_wallet_if_absent(account_id)?;
        tracing::debug!(account_id = %account_id, balance_cents = wallet.balance_cents, "Wallet ensured");
        Ok(wallet)
    }

    /// Current wallet figures.
    ///
    /// # Errors
    ///
    /// - `ServiceError::NotFound` if the account has no wallet yet; callers
    ///   that need one call [`Ledger::ensure_wallet`].
    /// - An error if the store fails.
    pub fn wallet_info(&self, account_id: AccountId) -> Result<WalletInfo> {
        let info = match self.store.get_wallet(account_id)? {
            Some(wallet) => WalletInfo::from(&wallet),
            None => {
                tracing::debug!(account_id = %account_id, "Wallet not found");
                return Err(ServiceError::not_found("wallet", account_id));
            }
        };
        tracing::debug!(account_id = %account_id, balance_cents = info.balance_cents, "Wallet read");
        Ok(info)
    }

    /// An account's ledger entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn list_transactions(
        &self,
        account_id: AccountId,
        filter: &EntryFilter,
        page: PageRequest,
    ) -> Result<Page<LedgerEntry>> {
        let (entries, total) = self.store.list_entries(account_id, filter, page)?;
        Ok(Page::new(entries, page, total))
    }

    /// One ledger entry, visible to its owner or an admin.
    ///
    /// # Errors
    ///
    /// - `ServiceError::NotFound` if the entry does not exist.
    /// - `ServiceError::PermissionDenied` if the requester is neither.
    pub fn transaction_detail(
        &self,
        requester: AccountId,
        transaction_id: &TransactionId,
        is_admin: bool,
    ) -> Result<LedgerEntry> {
        let entry = self
            .store
            .get_entry(transaction_id)?
            .ok_or_else(|| ServiceError::not_found("transaction", transaction_id))?;

        if !is_admin && entry.account_id != requester {
            tracing::warn!(
                requester = %requester,
                transaction_id = %transaction_id,
                "Transaction detail denied"
            );
            return Err(ServiceError::PermissionDenied(
                "transaction belongs to another account".into(),
            ));
        }

        Ok(entry)
    }
}
