//! Operator command line.
//!
//! Every command maps onto one ledger operation and prints its result as
//! JSON. [`run`] is generic over the store so the same dispatch runs against
//! the in-memory backend in tests.

use clap::{Parser, Subcommand};
use serde::Serialize;

use orbia_ledger_core::{
    parse_amount, AccountId, Actor, ConfirmProof, EntryFilter, EntryStatus, EntryType, OrderFilter,
    OrderId, OrderStatus, PageRequest, PaymentType, TransactionId,
};
use orbia_ledger_store::Store;

use crate::debit::DebitRequest;
use crate::error::{Result, ServiceError};
use crate::recharge::CryptoOrderRequest;
use crate::state::Ledger;

/// Actor name recorded when no admin account is given.
pub const CLI_ACTOR: &str = "cli";

/// Orbia wallet ledger operator tool.
#[derive(Parser, Debug)]
#[command(name = "orbia-ledger")]
#[command(version, about = "Operator tool for the orbia wallet ledger")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log filter used when `RUST_LOG` is unset
    #[arg(long, default_value = "info,orbia_ledger=debug")]
    pub log_level: String,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Wallet operations
    Wallet {
        /// Subcommand.
        #[command(subcommand)]
        command: WalletCommand,
    },

    /// Recharge orders
    Order {
        /// Subcommand.
        #[command(subcommand)]
        command: OrderCommand,
    },

    /// Deduct from a wallet
    Debit {
        /// Account to charge
        #[arg(long)]
        account: AccountId,

        /// Amount, e.g. `60.00`
        #[arg(long, value_parser = parse_amount)]
        amount: i64,

        /// Kind of record being paid for (e.g. `campaign`)
        #[arg(long)]
        related_type: Option<String>,

        /// ID of that record
        #[arg(long)]
        related_id: Option<String>,

        /// Free-form reason
        #[arg(long)]
        remark: Option<String>,
    },

    /// Ledger history
    Transactions {
        /// Subcommand.
        #[command(subcommand)]
        command: TransactionsCommand,
    },
}

/// Wallet subcommands.
#[derive(Subcommand, Debug)]
pub enum WalletCommand {
    /// Create the wallet if it does not exist
    Create {
        /// Owning account
        #[arg(long)]
        account: AccountId,
    },

    /// Show balances
    Show {
        /// Owning account
        #[arg(long)]
        account: AccountId,
    },
}

/// Recharge order subcommands.
#[derive(Subcommand, Debug)]
pub enum OrderCommand {
    /// Create a crypto recharge order
    Crypto {
        /// Account to credit
        #[arg(long)]
        account: AccountId,

        /// Amount, e.g. `100.00`
        #[arg(long, value_parser = parse_amount)]
        amount: i64,

        /// Payment setting ID
        #[arg(long)]
        setting: i64,

        /// Payer's sending address
        #[arg(long)]
        payer_address: String,

        /// On-chain transaction hash
        #[arg(long)]
        tx_hash: Option<String>,

        /// Payer remark
        #[arg(long)]
        remark: Option<String>,
    },

    /// Create an online-payment recharge order
    Online {
        /// Account to credit
        #[arg(long)]
        account: AccountId,

        /// Amount, e.g. `100.00`
        #[arg(long, value_parser = parse_amount)]
        amount: i64,

        /// Payment platform
        #[arg(long)]
        platform: String,
    },

    /// Confirm a pending order and credit the wallet
    Confirm {
        /// Order ID (`RCHORD_...`)
        order_id: OrderId,

        /// Confirming admin account
        #[arg(long)]
        admin: Option<AccountId>,

        /// On-chain transaction hash
        #[arg(long)]
        tx_hash: Option<String>,

        /// Admin remark
        #[arg(long)]
        remark: Option<String>,
    },

    /// Reject a pending order
    Reject {
        /// Order ID (`RCHORD_...`)
        order_id: OrderId,

        /// Rejecting admin account
        #[arg(long)]
        admin: Option<AccountId>,

        /// Why the order is rejected
        #[arg(long)]
        reason: String,
    },

    /// Show one order
    Show {
        /// Order ID (`RCHORD_...`)
        order_id: OrderId,

        /// Restrict to this account's orders
        #[arg(long)]
        requester: Option<AccountId>,
    },

    /// List orders
    List {
        /// Only this account's orders
        #[arg(long)]
        account: Option<AccountId>,

        /// Only orders in this state
        #[arg(long)]
        status: Option<OrderStatus>,

        /// Only orders paid this way
        #[arg(long)]
        payment_type: Option<PaymentType>,

        /// Page number
        #[arg(long, default_value = "1")]
        page: i64,

        /// Page size
        #[arg(long, default_value = "10")]
        size: i64,
    },
}

/// Ledger history subcommands.
#[derive(Subcommand, Debug)]
pub enum TransactionsCommand {
    /// List an account's entries, newest first
    List {
        /// Owning account
        #[arg(long)]
        account: AccountId,

        /// Only entries of this type
        #[arg(long = "type")]
        entry_type: Option<EntryType>,

        /// Only entries in this status
        #[arg(long)]
        status: Option<EntryStatus>,

        /// Page number
        #[arg(long, default_value = "1")]
        page: i64,

        /// Page size
        #[arg(long, default_value = "10")]
        size: i64,
    },

    /// Show one entry
    Show {
        /// Transaction ID (`TX_...`)
        transaction_id: TransactionId,

        /// Restrict to this account's entries
        #[arg(long)]
        requester: Option<AccountId>,
    },
}

fn actor(admin: Option<AccountId>) -> Actor {
    admin.map_or_else(|| Actor::System(CLI_ACTOR.into()), Actor::Admin)
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| ServiceError::Internal(e.to_string()))
}

/// Execute one command against the ledger.
///
/// # Errors
///
/// Returns whatever the underlying ledger operation returns.
pub fn run<S: Store>(ledger: &Ledger<S>, command: Command) -> Result<serde_json::Value> {
    match command {
        Command::Wallet { command } => match command {
            WalletCommand::Create { account } => to_json(&ledger.ensure_wallet(account)?),
            WalletCommand::Show { account } => to_json(&ledger.wallet_info(account)?),
        },

        Command::Order { command } => run_order(ledger, command),

        Command::Debit {
            account,
            amount,
            related_type,
            related_id,
            remark,
        } => to_json(&ledger.debit(DebitRequest {
            account_id: account,
            amount_cents: amount,
            related_order_type: related_type,
            related_order_id: related_id,
            remark,
        })?),

        Command::Transactions { command } => match command {
            TransactionsCommand::List {
                account,
                entry_type,
                status,
                page,
                size,
            } => to_json(&ledger.list_transactions(
                account,
                &EntryFilter { entry_type, status },
                PageRequest::new(page, size),
            )?),
            TransactionsCommand::Show {
                transaction_id,
                requester,
            } => {
                let requester_id = requester.unwrap_or(AccountId::new(0));
                to_json(&ledger.transaction_detail(
                    requester_id,
                    &transaction_id,
                    requester.is_none(),
                )?)
            }
        },
    }
}

fn run_order<S: Store>(ledger: &Ledger<S>, command: OrderCommand) -> Result<serde_json::Value> {
    match command {
        OrderCommand::Crypto {
            account,
            amount,
            setting,
            payer_address,
            tx_hash,
            remark,
        } => to_json(&ledger.create_crypto_order(CryptoOrderRequest {
            account_id: account,
            amount_cents: amount,
            payment_setting_id: setting,
            payer_crypto_address: payer_address,
            crypto_tx_hash: tx_hash,
            remark,
        })?),
        OrderCommand::Online {
            account,
            amount,
            platform,
        } => to_json(&ledger.create_online_order(account, amount, &platform)?),
        OrderCommand::Confirm {
            order_id,
            admin,
            tx_hash,
            remark,
        } => to_json(&ledger.confirm(
            &order_id,
            actor(admin),
            ConfirmProof {
                crypto_tx_hash: tx_hash,
                remark,
            },
        )?),
        OrderCommand::Reject {
            order_id,
            admin,
            reason,
        } => to_json(&ledger.reject(&order_id, actor(admin), &reason)?),
        OrderCommand::Show {
            order_id,
            requester,
        } => {
            let requester_id = requester.unwrap_or(AccountId::new(0));
            to_json(&ledger.order_detail(requester_id, &order_id, requester.is_none())?)
        }
        OrderCommand::List {
            account,
            status,
            payment_type,
            page,
            size,
        } => to_json(&ledger.all_orders(
            &OrderFilter {
                account_id: account,
                status,
                payment_type,
            },
            PageRequest::new(page, size),
        )?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_amounts_as_cents() {
        let cli = Cli::parse_from([
            "orbia-ledger",
            "order",
            "crypto",
            "--account",
            "42",
            "--amount",
            "100.00",
            "--setting",
            "1",
            "--payer-address",
            "TPayer",
        ]);
        match cli.command {
            Command::Order {
                command:
                    OrderCommand::Crypto {
                        account, amount, ..
                    },
            } => {
                assert_eq!(account, AccountId::new(42));
                assert_eq!(amount, 10_000);
            }
            other => panic!("expected crypto order, got {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_amount() {
        let parsed = Cli::try_parse_from([
            "orbia-ledger",
            "debit",
            "--account",
            "1",
            "--amount",
            "1.234",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn parses_filters_and_ids() {
        let cli = Cli::parse_from([
            "orbia-ledger",
            "order",
            "list",
            "--status",
            "pending",
            "--payment-type",
            "online",
            "--size",
            "500",
        ]);
        match cli.command {
            Command::Order {
                command:
                    OrderCommand::List {
                        status,
                        payment_type,
                        size,
                        ..
                    },
            } => {
                assert_eq!(status, Some(OrderStatus::Pending));
                assert_eq!(payment_type, Some(PaymentType::Online));
                assert_eq!(PageRequest::new(1, size).page_size(), 100);
            }
            other => panic!("expected order list, got {other:?}"),
        }

        assert!(Cli::try_parse_from(["orbia-ledger", "order", "confirm", "TX_1_2"]).is_err());
    }

    #[test]
    fn default_actor_is_cli() {
        assert_eq!(actor(None), Actor::System("cli".into()));
        assert_eq!(actor(Some(AccountId::new(7))), Actor::Admin(AccountId::new(7)));
    }
}
