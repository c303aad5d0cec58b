//! Orbia ledger operator CLI.
//!
//! Opens the `RocksDB` store named by `LEDGER_DATA_DIR`, runs one command and
//! prints the result as JSON.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orbia_ledger_service::cli::{run, Cli};
use orbia_ledger_service::{Ledger, LedgerConfig};
use orbia_ledger_store::RocksStore;

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = LedgerConfig::from_env()?;
    tracing::debug!(
        worker_id = config.worker_id,
        data_dir = %config.data_dir,
        payment_settings_file = ?config.payment_settings_file,
        "Configuration loaded"
    );

    let store = Arc::new(RocksStore::open(&config.data_dir)?);
    let ledger = Ledger::from_config(store, &config)?;

    match run(&ledger, cli.command) {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            if err.is_rejection() {
                tracing::warn!(code = err.reason_code(), error = %err, "Command rejected");
            } else {
                tracing::error!(error = %err, "Command failed");
            }
            let body = serde_json::json!({
                "error": {
                    "code": err.reason_code(),
                    "message": err.public_message(),
                }
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(ExitCode::FAILURE)
        }
    }
}
