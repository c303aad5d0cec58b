//! Common test utilities for ledger integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use orbia_ledger_core::{AccountId, Actor, ConfirmProof, IdGenerator, RechargeOrder};
use orbia_ledger_service::{CryptoOrderRequest, Ledger, PaymentSetting, StaticPaymentSettings};
use orbia_ledger_store::MemoryStore;

/// Active crypto payment setting.
pub const ACTIVE_SETTING: i64 = 1;

/// Disabled crypto payment setting.
pub const INACTIVE_SETTING: i64 = 2;

/// Admin used to resolve orders.
pub const ADMIN: AccountId = AccountId::new(1);

/// Test harness around an in-memory ledger.
pub struct TestHarness {
    /// The ledger under test.
    pub ledger: Ledger<MemoryStore>,
}

impl TestHarness {
    /// Create a new test harness with a fresh store.
    pub fn new() -> Self {
        let settings = StaticPaymentSettings::new([
            PaymentSetting {
                id: ACTIVE_SETTING,
                network: "TRC20".into(),
                address: "TTreasury".into(),
                label: "Main treasury".into(),
                active: true,
            },
            PaymentSetting {
                id: INACTIVE_SETTING,
                network: "ERC20".into(),
                address: "0xretired".into(),
                label: "Retired".into(),
                active: false,
            },
        ]);

        let ledger = Ledger::new(
            Arc::new(MemoryStore::new()),
            Arc::new(IdGenerator::new(7).expect("valid worker id")),
            Arc::new(settings),
        );

        Self { ledger }
    }

    /// Build a crypto order request against the active setting.
    pub fn crypto_request(account_id: AccountId, amount_cents: i64) -> CryptoOrderRequest {
        CryptoOrderRequest {
            account_id,
            amount_cents,
            payment_setting_id: ACTIVE_SETTING,
            payer_crypto_address: "TPayer".into(),
            crypto_tx_hash: None,
            remark: None,
        }
    }

    /// Create a pending crypto order.
    pub fn pending_order(&self, account_id: AccountId, amount_cents: i64) -> RechargeOrder {
        self.ledger
            .create_crypto_order(Self::crypto_request(account_id, amount_cents))
            .expect("Failed to create order")
    }

    /// Fund a wallet through a confirmed recharge.
    pub fn fund(&self, account_id: AccountId, amount_cents: i64) {
        let order = self.pending_order(account_id, amount_cents);
        self.ledger
            .confirm(&order.order_id, Actor::Admin(ADMIN), ConfirmProof::default())
            .expect("Failed to confirm order");
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
