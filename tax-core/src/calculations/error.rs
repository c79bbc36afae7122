use thiserror::Error;

use super::brackets::BracketTaxError;
use crate::db::RepositoryError;

/// How a [`CalculationError`] should be reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request itself was wrong; correcting it will succeed.
    InvalidInput,
    /// The request was fine but the currency has nothing to calculate with.
    NotConfigured,
    /// Storage or arithmetic failed; not the caller's fault.
    Infrastructure,
}

/// Every way a calculation or bracket listing can be refused.
///
/// Validation variants are listed in the order they are checked; the first
/// one that applies is the one reported.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CalculationError {
    #[error("Missing required parameter 'income'")]
    MissingParameter,

    #[error("Invalid income format")]
    InvalidFormat { provided: String },

    #[error("Income must not be negative")]
    NegativeIncome { provided: String },

    /// Syntactically valid, but too large to hold as minor units.
    #[error("Income is too large")]
    IncomeOutOfRange { provided: String },

    /// `code` is the normalized code that was looked up; `provided` is the
    /// trimmed value the caller sent.
    #[error("Unknown currency code: {code}")]
    UnknownCurrency { code: String, provided: String },

    #[error("Decimal places ({actual}) greater than allowed ({allowed})")]
    TooManyDecimalPlaces {
        actual: u32,
        allowed: u32,
        provided: String,
    },

    #[error("No brackets found for currency {code}")]
    NoBracketsConfigured { code: String },

    #[error("tax calculation failed: {0}")]
    Engine(BracketTaxError),

    #[error("tax configuration lookup failed: {0}")]
    Repository(#[from] RepositoryError),
}

impl CalculationError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingParameter
            | Self::InvalidFormat { .. }
            | Self::NegativeIncome { .. }
            | Self::IncomeOutOfRange { .. }
            | Self::UnknownCurrency { .. }
            | Self::TooManyDecimalPlaces { .. } => ErrorCategory::InvalidInput,
            Self::NoBracketsConfigured { .. } => ErrorCategory::NotConfigured,
            Self::Engine(_) | Self::Repository(_) => ErrorCategory::Infrastructure,
        }
    }

    /// The raw value the caller supplied that caused the error, if any.
    pub fn provided(&self) -> Option<&str> {
        match self {
            Self::InvalidFormat { provided }
            | Self::NegativeIncome { provided }
            | Self::IncomeOutOfRange { provided }
            | Self::TooManyDecimalPlaces { provided, .. }
            | Self::UnknownCurrency { provided, .. } => Some(provided),
            Self::MissingParameter
            | Self::NoBracketsConfigured { .. }
            | Self::Engine(_)
            | Self::Repository(_) => None,
        }
    }
}
