use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::ValidationError;
use crate::calculations::common::round_half_up;

/// A currency that tax brackets are configured in.
///
/// Amounts are held as integer counts of minor units (cents, pence). The
/// `divisor` is the number of minor units in one major unit and must be an
/// exact power of ten; the number of decimal places is derived from it
/// rather than stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// Uppercase business key, e.g. `NZD`.
    pub code: String,
    pub name: String,
    /// Display prefix, e.g. `$`.
    pub symbol: String,
    pub divisor: i64,
}

impl Currency {
    /// Trims and uppercases a user-supplied currency code.
    pub fn normalize_code(raw: &str) -> String {
        raw.trim().to_ascii_uppercase()
    }

    /// Number of fractional digits represented by the divisor.
    ///
    /// Truncated `log10(divisor)`; a non-positive divisor yields 0.
    pub fn decimal_places(&self) -> u32 {
        if self.divisor <= 0 {
            return 0;
        }
        self.divisor.ilog10()
    }

    /// Checks the record against the currency rules.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.code.trim().is_empty() {
            return Err(ValidationError::MissingField("code"));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.symbol.trim().is_empty() {
            return Err(ValidationError::MissingField("symbol"));
        }
        if self.divisor <= 0 {
            return Err(ValidationError::DivisorNotPositive(self.divisor));
        }
        if 10_i64.checked_pow(self.decimal_places()) != Some(self.divisor) {
            return Err(ValidationError::DivisorNotPowerOfTen(self.divisor));
        }
        Ok(())
    }

    /// Converts a major-unit amount into an exact count of minor units.
    ///
    /// Returns `None` if the result does not fit in an `i64`.
    pub fn to_minor_units(&self, amount: Decimal) -> Option<i64> {
        let scaled = amount.checked_mul(Decimal::from(self.divisor))?;
        round_half_up(scaled, 0).to_i64()
    }

    /// Formats a minor-unit amount with exactly `decimal_places` fractional
    /// digits, e.g. `6487750` -> `"64877.50"` for a divisor of 100.
    pub fn format_minor_units(&self, minor_units: i64) -> String {
        let places = self.decimal_places();
        let amount = Decimal::new(minor_units, places);
        format!("{:.*}", places as usize, amount)
    }

    /// Formats the whole-unit part of an amount for labels, e.g. `"$15,600"`.
    pub fn format_whole_units(&self, minor_units: i64, thousands_delimiter: &str) -> String {
        let whole = if self.divisor > 0 {
            minor_units / self.divisor
        } else {
            minor_units
        };
        format!(
            "{}{}",
            self.symbol,
            group_thousands(whole, thousands_delimiter)
        )
    }
}

fn group_thousands(value: i64, delimiter: &str) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 * delimiter.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push_str(delimiter);
        }
        grouped.push(ch);
    }
    if value < 0 {
        grouped.insert(0, '-');
    }
    grouped
}
