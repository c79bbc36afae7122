//! Calculation entry points used by the HTTP layer.
//!
//! [`TaxCalculator`] wires the validator, the repository and the bracket
//! engine together and renders results in their wire shape. It holds no
//! mutable state, so one instance can serve any number of concurrent
//! requests.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use super::brackets::{BracketTaxCalculator, BracketTaxError};
use super::common::format_rate;
use super::error::CalculationError;
use super::validation::{IncomeValidator, lookup_currency};
use crate::db::TaxRepository;
use crate::{Currency, TaxBracket};

/// Currency fields echoed back in responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencySummary {
    pub code: String,
    pub symbol: String,
}

impl From<&Currency> for CurrencySummary {
    fn from(currency: &Currency) -> Self {
        Self {
            code: currency.code.clone(),
            symbol: currency.symbol.clone(),
        }
    }
}

/// Tax attributed to one bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BracketBreakdown {
    pub bracket_id: i64,
    pub lower_cents: i64,
    pub upper_cents: Option<i64>,
    pub rate: String,
    pub tax: String,
}

/// Result of a successful calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxCalculationReport {
    /// The income string exactly as supplied.
    pub income: String,
    pub total_tax: String,
    pub breakdown: Vec<BracketBreakdown>,
    pub currency: CurrencySummary,
}

/// One bracket in a listing, with its owning currency embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BracketListing {
    pub id: i64,
    pub lower_cents: i64,
    pub upper_cents: Option<i64>,
    pub rate: String,
    pub currency: CurrencySummary,
}

impl BracketListing {
    fn new(bracket: &TaxBracket, currency: CurrencySummary) -> Self {
        Self {
            id: bracket.id,
            lower_cents: bracket.lower_cents,
            upper_cents: bracket.upper_cents,
            rate: format_rate(bracket.rate),
            currency,
        }
    }
}

#[derive(Clone)]
pub struct TaxCalculator {
    repo: Arc<dyn TaxRepository>,
    validator: IncomeValidator,
}

impl TaxCalculator {
    pub fn new(repo: Arc<dyn TaxRepository>, default_currency: &str) -> Self {
        Self {
            repo,
            validator: IncomeValidator::new(default_currency),
        }
    }

    pub fn default_currency(&self) -> &str {
        self.validator.default_currency()
    }

    /// Validates the raw inputs and computes tax against the currency's
    /// configured brackets.
    ///
    /// # Errors
    ///
    /// Validation errors in rule order, then
    /// [`CalculationError::NoBracketsConfigured`] for a currency without
    /// brackets. Storage and overflow failures are reported as
    /// infrastructure errors.
    pub async fn calculate(
        &self,
        income: Option<&str>,
        currency: Option<&str>,
    ) -> Result<TaxCalculationReport, CalculationError> {
        let validated = self
            .validator
            .validate(self.repo.as_ref(), income, currency)
            .await?;
        let currency = validated.currency;

        let brackets = self.repo.get_tax_brackets(&currency.code).await?;
        let result = BracketTaxCalculator::new(&brackets)
            .calculate(validated.minor_units)
            .map_err(|e| match e {
                BracketTaxError::NoBracketsConfigured => CalculationError::NoBracketsConfigured {
                    code: currency.code.clone(),
                },
                other => CalculationError::Engine(other),
            })?;

        tracing::debug!(
            currency = %currency.code,
            income_minor_units = result.income_minor_units,
            total_tax_minor_units = result.total_tax_minor_units,
            "calculated tax"
        );

        let breakdown = result
            .breakdown
            .iter()
            .map(|entry| BracketBreakdown {
                bracket_id: entry.bracket.id,
                lower_cents: entry.bracket.lower_cents,
                upper_cents: entry.bracket.upper_cents,
                rate: format_rate(entry.bracket.rate),
                tax: currency.format_minor_units(entry.tax_minor_units),
            })
            .collect();

        Ok(TaxCalculationReport {
            income: validated.raw,
            total_tax: currency.format_minor_units(result.total_tax_minor_units),
            breakdown,
            currency: CurrencySummary::from(&currency),
        })
    }

    /// Lists configured brackets ordered by `lower_cents`.
    ///
    /// A blank or absent currency lists every currency's brackets.
    pub async fn list_brackets(
        &self,
        currency: Option<&str>,
    ) -> Result<Vec<BracketListing>, CalculationError> {
        let requested = currency.map(str::trim).filter(|code| !code.is_empty());

        match requested {
            Some(requested) => {
                let currency = lookup_currency(self.repo.as_ref(), requested).await?;
                let summary = CurrencySummary::from(&currency);
                let brackets = self.repo.get_tax_brackets(&currency.code).await?;
                Ok(brackets
                    .iter()
                    .map(|b| BracketListing::new(b, summary.clone()))
                    .collect())
            }
            None => {
                let currencies: HashMap<String, CurrencySummary> = self
                    .repo
                    .list_currencies()
                    .await?
                    .iter()
                    .map(|c| (c.code.clone(), CurrencySummary::from(c)))
                    .collect();
                let brackets = self.repo.list_tax_brackets().await?;

                Ok(brackets
                    .iter()
                    .map(|b| {
                        let summary = currencies.get(&b.currency_code).cloned().unwrap_or_else(
                            || CurrencySummary {
                                code: b.currency_code.clone(),
                                symbol: String::new(),
                            },
                        );
                        BracketListing::new(b, summary)
                    })
                    .collect())
            }
        }
    }
}
