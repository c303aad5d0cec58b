//! Wallet ledger workflows for orbia.
//!
//! This crate wires the core types and a [`orbia_ledger_store::Store`] into
//! the operations callers use:
//!
//! - **Wallets**: `ensure_wallet`, `wallet_info`, transaction history
//! - **Recharge orders**: crypto/online creation, `confirm`, `reject`, listings
//! - **Debits**: `debit` with related-order linkage
//!
//! The `orbia-ledger` binary (feature `rocksdb-backend`) exposes the same
//! operations as an operator CLI.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cli;
pub mod config;
pub mod debit;
pub mod error;
pub mod payment_settings;
pub mod recharge;
pub mod state;
pub mod wallet;

pub use config::LedgerConfig;
pub use debit::DebitRequest;
pub use error::{Result, ServiceError};
pub use payment_settings::{PaymentSetting, PaymentSettings, StaticPaymentSettings};
pub use recharge::{ConfirmedRecharge, CryptoOrderRequest, OnlineOrderCreated};
pub use state::Ledger;
pub use wallet::WalletInfo;
