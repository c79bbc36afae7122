//! Progressive bracket tax engine.
//!
//! Walks a currency's brackets in ascending `lower_cents` order and taxes the
//! slice of income that falls inside each one. All amounts are integer minor
//! units; the only non-integer value is the bracket rate, and each bracket's
//! product is rounded half-up to a whole minor unit before being summed.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::BracketTaxCalculator;
//! use tax_core::TaxBracket;
//!
//! let brackets = vec![
//!     TaxBracket {
//!         id: 1,
//!         currency_code: "NZD".to_string(),
//!         lower_cents: 0,
//!         upper_cents: Some(1_560_000),
//!         rate: dec!(0.105),
//!     },
//!     TaxBracket {
//!         id: 2,
//!         currency_code: "NZD".to_string(),
//!         lower_cents: 1_560_001,
//!         upper_cents: None,
//!         rate: dec!(0.175),
//!     },
//! ];
//!
//! let result = BracketTaxCalculator::new(&brackets).calculate(1_000_000).unwrap();
//! assert_eq!(result.total_tax_minor_units, 105_000);
//! assert_eq!(result.breakdown.len(), 2);
//! ```

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;

use crate::TaxBracket;
use crate::calculations::common::round_half_up;

/// Errors that can occur while applying a bracket schedule.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BracketTaxError {
    /// The currency has no brackets to apply.
    #[error("no tax brackets configured")]
    NoBracketsConfigured,

    /// An intermediate amount does not fit in 64-bit minor units.
    #[error("tax amount overflow in bracket {bracket_id}")]
    Overflow { bracket_id: i64 },
}

/// Tax owed within a single bracket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketTax<'a> {
    pub bracket: &'a TaxBracket,
    pub tax_minor_units: i64,
}

/// Outcome of applying a full bracket schedule to one income.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketTaxResult<'a> {
    pub income_minor_units: i64,
    pub total_tax_minor_units: i64,
    /// One entry per configured bracket, in schedule order, including
    /// brackets the income never reached.
    pub breakdown: Vec<BracketTax<'a>>,
}

/// Applies an ordered bracket schedule to incomes.
///
/// Brackets must be sorted by `lower_cents` ascending. The calculator does
/// not reorder them.
#[derive(Debug, Clone)]
pub struct BracketTaxCalculator<'a> {
    brackets: &'a [TaxBracket],
}

impl<'a> BracketTaxCalculator<'a> {
    pub fn new(brackets: &'a [TaxBracket]) -> Self {
        Self { brackets }
    }

    /// Computes per-bracket and total tax for a non-negative income.
    ///
    /// # Errors
    ///
    /// * [`BracketTaxError::NoBracketsConfigured`] when the schedule is empty.
    /// * [`BracketTaxError::Overflow`] when a product or the running total
    ///   leaves the `i64` range.
    pub fn calculate(
        &self,
        income_minor_units: i64,
    ) -> Result<BracketTaxResult<'a>, BracketTaxError> {
        if self.brackets.is_empty() {
            return Err(BracketTaxError::NoBracketsConfigured);
        }

        let mut total_tax_minor_units: i64 = 0;
        let mut breakdown = Vec::with_capacity(self.brackets.len());

        for bracket in self.brackets {
            let tax_minor_units = bracket_tax(income_minor_units, bracket)?;
            total_tax_minor_units = total_tax_minor_units
                .checked_add(tax_minor_units)
                .ok_or(BracketTaxError::Overflow {
                    bracket_id: bracket.id,
                })?;
            breakdown.push(BracketTax {
                bracket,
                tax_minor_units,
            });
        }

        tracing::trace!(
            income_minor_units,
            total_tax_minor_units,
            brackets = self.brackets.len(),
            "applied bracket schedule"
        );

        Ok(BracketTaxResult {
            income_minor_units,
            total_tax_minor_units,
            breakdown,
        })
    }
}

/// Tax on the part of `income_minor_units` that falls inside `bracket`.
fn bracket_tax(income_minor_units: i64, bracket: &TaxBracket) -> Result<i64, BracketTaxError> {
    let overflow = BracketTaxError::Overflow {
        bracket_id: bracket.id,
    };

    let effective_upper = bracket.upper_cents.unwrap_or(income_minor_units);
    let taxable = income_minor_units
        .min(effective_upper)
        .checked_sub(bracket.lower_cents)
        .ok_or_else(|| overflow.clone())?;
    if taxable <= 0 {
        return Ok(0);
    }

    let product = Decimal::from(taxable)
        .checked_mul(bracket.rate)
        .ok_or_else(|| overflow.clone())?;
    round_half_up(product, 0).to_i64().ok_or(overflow)
}
