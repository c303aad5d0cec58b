//! Payment destinations offered to payers.
//!
//! Settings are owned by the surrounding admin system. The ledger only looks
//! one up when a crypto order is created and copies it into the order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use orbia_ledger_core::PaymentDestination;

/// One configured payment destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSetting {
    /// Setting ID referenced by orders.
    pub id: i64,
    /// Chain / network name.
    pub network: String,
    /// Receiving address.
    pub address: String,
    /// Display label.
    #[serde(default)]
    pub label: String,
    /// Whether new orders may use this setting.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl PaymentSetting {
    /// The snapshot stored on an order.
    #[must_use]
    pub fn destination(&self) -> PaymentDestination {
        PaymentDestination {
            network: self.network.clone(),
            address: self.address.clone(),
            label: self.label.clone(),
        }
    }
}

/// Lookup of payment settings by ID.
pub trait PaymentSettings: Send + Sync {
    /// Find a setting, active or not.
    fn find(&self, id: i64) -> Option<PaymentSetting>;
}

/// A fixed set of settings, typically loaded from the configuration file.
#[derive(Debug, Clone, Default)]
pub struct StaticPaymentSettings {
    settings: HashMap<i64, PaymentSetting>,
}

impl StaticPaymentSettings {
    /// Index the given settings by ID. Later duplicates win.
    #[must_use]
    pub fn new(settings: impl IntoIterator<Item = PaymentSetting>) -> Self {
        Self {
            settings: settings.into_iter().map(|s| (s.id, s)).collect(),
        }
    }
}

impl PaymentSettings for StaticPaymentSettings {
    fn find(&self, id: i64) -> Option<PaymentSetting> {
        self.settings.get(&id).cloned()
    }
}
