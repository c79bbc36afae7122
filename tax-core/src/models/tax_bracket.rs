use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Currency, ValidationError};

/// One band of a currency's progressive tax schedule.
///
/// Bounds are in minor units. `lower_cents` is inclusive; a missing
/// `upper_cents` means the bracket applies to everything above the lower
/// bound ("and over").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub id: i64,
    pub currency_code: String,
    pub lower_cents: i64,
    pub upper_cents: Option<i64>,
    /// Decimal fraction, e.g. `0.175` for 17.5%.
    pub rate: Decimal,
}

impl TaxBracket {
    /// Human label for the bracket, e.g. `"$15,600 - $53,500"` or
    /// `"$180,000 and over"`.
    pub fn label(&self, currency: &Currency, thousands_delimiter: &str) -> String {
        bracket_label(
            currency,
            self.lower_cents,
            self.upper_cents,
            thousands_delimiter,
        )
    }
}

/// For creating new brackets (no id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTaxBracket {
    pub currency_code: String,
    pub lower_cents: i64,
    pub upper_cents: Option<i64>,
    pub rate: Decimal,
}

impl NewTaxBracket {
    /// Checks the record against the bracket rules.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.currency_code.trim().is_empty() {
            return Err(ValidationError::MissingField("currency_code"));
        }
        if self.lower_cents < 0 {
            return Err(ValidationError::NegativeLowerBound(self.lower_cents));
        }
        if self.rate <= Decimal::ZERO {
            return Err(ValidationError::RateNotPositive(self.rate));
        }
        if let Some(upper) = self.upper_cents {
            if upper <= self.lower_cents {
                return Err(ValidationError::UpperNotAboveLower {
                    lower: self.lower_cents,
                    upper,
                });
            }
        }
        Ok(())
    }

    pub fn label(&self, currency: &Currency, thousands_delimiter: &str) -> String {
        bracket_label(
            currency,
            self.lower_cents,
            self.upper_cents,
            thousands_delimiter,
        )
    }

    /// Attaches a storage id, producing the persisted form.
    pub fn with_id(self, id: i64) -> TaxBracket {
        TaxBracket {
            id,
            currency_code: self.currency_code,
            lower_cents: self.lower_cents,
            upper_cents: self.upper_cents,
            rate: self.rate,
        }
    }
}

fn bracket_label(
    currency: &Currency,
    lower_cents: i64,
    upper_cents: Option<i64>,
    thousands_delimiter: &str,
) -> String {
    let lower = currency.format_whole_units(lower_cents, thousands_delimiter);
    match upper_cents {
        Some(upper_cents) => {
            let upper = currency.format_whole_units(upper_cents, thousands_delimiter);
            format!("{lower} - {upper}")
        }
        None => format!("{lower} and over"),
    }
}
