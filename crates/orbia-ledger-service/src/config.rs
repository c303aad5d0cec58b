//! Service configuration.

use std::path::Path;

use orbia_ledger_core::ids::MAX_WORKER_ID;

use crate::error::{Result, ServiceError};
use crate::payment_settings::PaymentSetting;

/// Ledger configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Snowflake worker ID of this process (default: 1).
    pub worker_id: u16,

    /// Path to `RocksDB` data directory (default: "/data/orbia-ledger").
    pub data_dir: String,

    /// Where the payment settings were loaded from, if anywhere.
    pub payment_settings_file: Option<String>,

    /// Payment destinations available to crypto orders.
    pub payment_settings: Vec<PaymentSetting>,
}

impl LedgerConfig {
    /// Load configuration from environment variables and the payment settings file.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Config` if `LEDGER_WORKER_ID` is not a number in
    /// `0..=1023` or the settings file cannot be read or parsed.
    pub fn from_env() -> Result<Self> {
        let worker_id = match std::env::var("LEDGER_WORKER_ID") {
            Ok(raw) => parse_worker_id(&raw)?,
            Err(_) => 1,
        };

        let payment_settings_file = std::env::var("LEDGER_PAYMENT_SETTINGS_FILE").ok();
        let payment_settings = match &payment_settings_file {
            Some(path) => {
                let settings: Vec<PaymentSetting> = load_settings_file(path)
                    .map_err(|e| ServiceError::Config(format!("{path}: {e}")))?;
                tracing::info!(path = %path, count = settings.len(), "Loaded payment settings from file");
                settings
            }
            None => {
                tracing::debug!("No payment settings file configured");
                Vec::new()
            }
        };

        Ok(Self {
            worker_id,
            data_dir: std::env::var("LEDGER_DATA_DIR")
                .unwrap_or_else(|_| "/data/orbia-ledger".into()),
            payment_settings_file,
            payment_settings,
        })
    }
}

/// Parse and range-check a worker ID.
///
/// # Errors
///
/// Returns `ServiceError::Config` for non-numeric or out-of-range input.
pub fn parse_worker_id(raw: &str) -> Result<u16> {
    raw.trim()
        .parse::<u16>()
        .ok()
        .filter(|id| *id <= MAX_WORKER_ID)
        .ok_or_else(|| {
            ServiceError::Config(format!(
                "LEDGER_WORKER_ID must be between 0 and {MAX_WORKER_ID}, got {raw:?}"
            ))
        })
}

/// Load a JSON file.
fn load_settings_file<T: serde::de::DeserializeOwned>(path: &str) -> std::result::Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Settings file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            worker_id: 1,
            data_dir: "/data/orbia-ledger".into(),
            payment_settings_file: None,
            payment_settings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn worker_id_range_checked() {
        assert_eq!(parse_worker_id("0").unwrap(), 0);
        assert_eq!(parse_worker_id(" 1023 ").unwrap(), 1023);
        assert!(matches!(parse_worker_id("1024"), Err(ServiceError::Config(_))));
        assert!(parse_worker_id("-1").is_err());
        assert!(parse_worker_id("one").is_err());
    }

    #[test]
    fn settings_file_parses_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": 1, "network": "TRC20", "address": "TXYZ"}},
                {{"id": 2, "network": "ERC20", "address": "0xabc", "label": "Old", "active": false}}]"#
        )
        .unwrap();

        let settings: Vec<PaymentSetting> =
            load_settings_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(settings.len(), 2);
        assert!(settings[0].active);
        assert_eq!(settings[0].label, "");
        assert!(!settings[1].active);
    }

    #[test]
    fn missing_settings_file_is_an_error() {
        let err = load_settings_file::<Vec<PaymentSetting>>("/nonexistent/settings.json").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
