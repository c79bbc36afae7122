use rust_decimal::Decimal;
use thiserror::Error;

/// A configuration record that breaks one of the model rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must be present")]
    MissingField(&'static str),

    #[error("divisor must be greater than 0 (got {0})")]
    DivisorNotPositive(i64),

    #[error("divisor must be a power of 10 (e.g., 1, 10, 100, 1000), got {0}")]
    DivisorNotPowerOfTen(i64),

    #[error("lower_cents must be greater than or equal to 0 (got {0})")]
    NegativeLowerBound(i64),

    #[error("upper_cents ({upper}) must be greater than lower_cents ({lower})")]
    UpperNotAboveLower { lower: i64, upper: i64 },

    #[error("rate must be greater than 0 (got {0})")]
    RateNotPositive(Decimal),
}
