//! Ledger wiring.

use std::sync::Arc;

use orbia_ledger_core::IdGenerator;
use orbia_ledger_store::Store;

use crate::config::LedgerConfig;
use crate::error::Result;
use crate::payment_settings::{PaymentSettings, StaticPaymentSettings};

/// The wallet ledger: a store, an ID generator and the payment settings.
///
/// Workflows live in [`crate::wallet`], [`crate::recharge`] and
/// [`crate::debit`] as `impl` blocks on this type.
pub struct Ledger<S> {
    pub(crate) store: Arc<S>,
    pub(crate) ids: Arc<IdGenerator>,
    pub(crate) payment_settings: Arc<dyn PaymentSettings>,
}

impl<S: Store> Ledger<S> {
    /// Assemble a ledger from its parts.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        ids: Arc<IdGenerator>,
        payment_settings: Arc<dyn PaymentSettings>,
    ) -> Self {
        Self {
            store,
            ids,
            payment_settings,
        }
    }

    /// Build a ledger from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Config` if the worker ID is out of range.
    pub fn from_config(store: Arc<S>, config: &LedgerConfig) -> Result<Self> {
        let ids = IdGenerator::new(config.worker_id)?;
        tracing::info!(
            worker_id = config.worker_id,
            payment_settings = config.payment_settings.len(),
            "Ledger configured"
        );

        Ok(Self::new(
            store,
            Arc::new(ids),
            Arc::new(StaticPaymentSettings::new(config.payment_settings.clone())),
        ))
    }

    /// The storage backend.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The ID generator.
    #[must_use]
    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }
}

impl<S> Clone for Ledger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            ids: Arc::clone(&self.ids),
            payment_settings: Arc::clone(&self.payment_settings),
        }
    }
}
