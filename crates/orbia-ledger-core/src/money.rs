//! Amount parsing and formatting.
//!
//! Amounts are stored as `i64` minor units (cents). `"100.00"` is `10_000`.

use crate::error::{LedgerError, Result};

/// Minor units per major unit.
pub const CENTS_PER_UNIT: i64 = 100;

/// Parse a non-negative decimal with at most two fractional digits into cents.
///
/// # Errors
///
/// Returns `LedgerError::InvalidAmount` for signs, extra precision, empty
/// parts, non-digits, or overflow.
pub fn parse_amount(input: &str) -> Result<i64> {
    let invalid = || LedgerError::InvalidAmount(input.to_string());
    let trimmed = input.trim();

    let (units, fraction) = match trimmed.split_once('.') {
        Some((units, fraction)) => (units, fraction),
        None => (trimmed, ""),
    };

    if units.is_empty()
        || fraction.len() > 2
        || !units.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
        || (trimmed.contains('.') && fraction.is_empty())
    {
        return Err(invalid());
    }

    let units: i64 = units.parse().map_err(|_| invalid())?;
    let cents: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => fraction.parse().map_err(|_| invalid())?,
    };

    units
        .checked_mul(CENTS_PER_UNIT)
        .and_then(|v| v.checked_add(cents))
        .ok_or_else(invalid)
}

/// Format cents as a two-decimal string, e.g. `10_050` -> `"100.50"`.
#[must_use]
pub fn format_amount(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let per_unit = CENTS_PER_UNIT.unsigned_abs();
    format!("{sign}{}.{:02}", abs / per_unit, abs % per_unit)
}

/// Require a strictly positive amount.
///
/// # Errors
///
/// Returns `LedgerError::InvalidAmount` if `amount_cents <= 0`.
pub fn ensure_positive(amount_cents: i64) -> Result<i64> {
    if amount_cents > 0 {
        Ok(amount_cents)
    } else {
        Err(LedgerError::InvalidAmount(format!(
            "amount must be greater than 0, got {}",
            format_amount(amount_cents)
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_amounts() {
        assert_eq!(parse_amount("100.00").unwrap(), 10_000);
        assert_eq!(parse_amount("100").unwrap(), 10_000);
        assert_eq!(parse_amount("0.5").unwrap(), 50);
        assert_eq!(parse_amount(" 60.05 ").unwrap(), 6_005);
        assert_eq!(parse_amount("0").unwrap(), 0);
    }

    #[test]
    fn rejects_malformed_amounts() {
        for bad in ["", "-1", "+1", "1.234", "1.", ".5", "abc", "1,00", "99999999999999999999"] {
            assert!(parse_amount(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn formats_cents() {
        assert_eq!(format_amount(10_000), "100.00");
        assert_eq!(format_amount(5), "0.05");
        assert_eq!(format_amount(-6_005), "-60.05");
    }

    #[test]
    fn positive_check() {
        assert_eq!(ensure_positive(1).unwrap(), 1);
        assert!(matches!(
            ensure_positive(0),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(ensure_positive(-100).is_err());
    }
}
