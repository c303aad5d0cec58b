//! Core types for the orbia wallet ledger.
//!
//! - **Identifiers**: `IdGenerator`, `Snowflake`, `AccountId`, `OrderId`, `TransactionId`
//! - **Wallets**: `Wallet`, `BalanceDelta`
//! - **Ledger**: `LedgerEntry`, `EntryType`, `EntryStatus`
//! - **Recharge orders**: `RechargeOrder`, `OrderStatus`, `PaymentType`
//! - **Listing**: `PageRequest`, `Page`
//!
//! # Money
//!
//! All amounts are `i64` cents: `"100.00"` is `10_000`. See [`money`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod ledger;
pub mod money;
pub mod order;
pub mod pagination;
pub mod wallet;

pub use error::{LedgerError, Result};
pub use ids::{AccountId, Clock, IdError, IdGenerator, OrderId, Snowflake, SystemClock, TransactionId};
pub use ledger::{EntryFilter, EntryStatus, EntryType, LedgerEntry};
pub use money::{ensure_positive, format_amount, parse_amount};
pub use order::{
    Actor, ConfirmProof, CryptoOrderDraft, OrderFilter, OrderStatus, PaymentDestination,
    PaymentType, RechargeOrder,
};
pub use pagination::{Page, PageRequest};
pub use wallet::{BalanceDelta, Wallet};
