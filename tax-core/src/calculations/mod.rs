//! Progressive income tax calculation.
//!
//! [`validation`] turns raw request values into an exact minor-unit income,
//! [`brackets`] applies a bracket schedule to it, and [`service`] combines
//! the two with the configured repository.

pub mod brackets;
pub mod common;
pub mod error;
pub mod service;
pub mod validation;

pub use brackets::{BracketTax, BracketTaxCalculator, BracketTaxError, BracketTaxResult};
pub use error::{CalculationError, ErrorCategory};
pub use service::{
    BracketBreakdown, BracketListing, CurrencySummary, TaxCalculationReport, TaxCalculator,
};
pub use validation::{IncomeValidator, ParsedIncome, ValidatedIncome};
