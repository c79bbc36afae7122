//! Request validation for tax calculations.
//!
//! Turns the raw `income` and `currency` query values into an exact minor-unit
//! amount and a resolved [`Currency`], or the first rule the input breaks.
//! Rules are checked in this order:
//!
//! 1. income present (after trimming)
//! 2. income is a plain decimal numeral (`[+-]digits[.digits]`)
//! 3. income is not negative
//! 4. currency code is known
//! 5. income has no more significant fractional digits than the currency
//!    allows (trailing zeros are not significant)
//! 6. income fits in a 64-bit count of minor units
//!
//! Rules 3 and 5 work on the digits of the numeral, so an input too large
//! for [`Decimal`] still reports the earlier rule it breaks.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use super::error::CalculationError;
use crate::Currency;
use crate::db::{RepositoryError, TaxRepository};

static NUMERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?)([0-9]*)(?:\.([0-9]*))?$").expect("numeral pattern is valid")
});

/// An income that passed every validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedIncome {
    /// The income exactly as the caller supplied it.
    pub raw: String,
    pub amount: Decimal,
    pub minor_units: i64,
    pub currency: Currency,
}

/// A syntactically valid income numeral with insignificant zeros removed.
///
/// Zero is never negative, so `"-0"` and `"-0.00"` parse as plain zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIncome {
    negative: bool,
    /// Whole-number digits without leading zeros; `"0"` for none.
    whole: String,
    /// Fractional digits without trailing zeros.
    fraction: String,
}

impl ParsedIncome {
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Number of significant fractional digits.
    pub fn fractional_digits(&self) -> u32 {
        u32::try_from(self.fraction.len()).unwrap_or(u32::MAX)
    }

    /// The exact decimal value, or `None` when it exceeds [`Decimal`]'s
    /// range or precision.
    pub fn to_decimal(&self) -> Option<Decimal> {
        let sign = if self.negative { "-" } else { "" };
        let text = if self.fraction.is_empty() {
            format!("{sign}{}", self.whole)
        } else {
            format!("{sign}{}.{}", self.whole, self.fraction)
        };
        Decimal::from_str_exact(&text).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomeValidator {
    default_currency: String,
}

impl IncomeValidator {
    /// `default_currency` is used when the request names no currency.
    pub fn new(default_currency: &str) -> Self {
        Self {
            default_currency: Currency::normalize_code(default_currency),
        }
    }

    pub fn default_currency(&self) -> &str {
        &self.default_currency
    }

    /// Applies every rule and returns the first violation.
    pub async fn validate(
        &self,
        repo: &dyn TaxRepository,
        income: Option<&str>,
        currency: Option<&str>,
    ) -> Result<ValidatedIncome, CalculationError> {
        let raw = match income {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Err(CalculationError::MissingParameter),
        };

        let parsed = parse_income(raw)?;

        if parsed.is_negative() {
            return Err(CalculationError::NegativeIncome {
                provided: raw.to_string(),
            });
        }

        let requested = currency
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .unwrap_or(&self.default_currency);
        let currency = lookup_currency(repo, requested).await?;

        let actual = parsed.fractional_digits();
        let allowed = currency.decimal_places();
        if actual > allowed {
            return Err(CalculationError::TooManyDecimalPlaces {
                actual,
                allowed,
                provided: raw.to_string(),
            });
        }

        let out_of_range = || CalculationError::IncomeOutOfRange {
            provided: raw.to_string(),
        };
        let amount = parsed.to_decimal().ok_or_else(out_of_range)?;
        let minor_units = currency.to_minor_units(amount).ok_or_else(out_of_range)?;

        Ok(ValidatedIncome {
            raw: raw.to_string(),
            amount,
            minor_units,
            currency,
        })
    }
}

/// Looks up a currency by the code the caller sent, mapping "not found" to
/// [`CalculationError::UnknownCurrency`] and anything else to a storage
/// failure.
///
/// The code is trimmed and uppercased before the lookup.
pub async fn lookup_currency(
    repo: &dyn TaxRepository,
    requested: &str,
) -> Result<Currency, CalculationError> {
    let code = Currency::normalize_code(requested);
    match repo.get_currency(&code).await {
        Ok(currency) => Ok(currency),
        Err(RepositoryError::NotFound) => Err(CalculationError::UnknownCurrency {
            code,
            provided: requested.trim().to_string(),
        }),
        Err(e) => Err(CalculationError::Repository(e)),
    }
}

/// Parses an income string into its sign and significant digits.
///
/// Surrounding whitespace is ignored. Exponents, thousands separators and
/// currency symbols are rejected. Any length of digits is accepted here;
/// range is checked by [`ParsedIncome::to_decimal`].
pub fn parse_income(raw: &str) -> Result<ParsedIncome, CalculationError> {
    let trimmed = raw.trim();
    let invalid = || CalculationError::InvalidFormat {
        provided: raw.to_string(),
    };

    let caps = NUMERAL.captures(trimmed).ok_or_else(invalid)?;
    let sign = caps.get(1).map_or("", |m| m.as_str());
    let whole = caps.get(2).map_or("", |m| m.as_str());
    let fraction = caps.get(3).map_or("", |m| m.as_str());
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }

    let whole = whole.trim_start_matches('0');
    let fraction = fraction.trim_end_matches('0');
    let is_zero = whole.is_empty() && fraction.is_empty();

    Ok(ParsedIncome {
        negative: sign == "-" && !is_zero,
        whole: if whole.is_empty() { "0" } else { whole }.to_string(),
        fraction: fraction.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::db::InMemoryRepository;

    fn jpy() -> Currency {
        Currency {
            code: "JPY".to_string(),
            name: "Japanese Yen".to_string(),
            symbol: "¥".to_string(),
            divisor: 1,
        }
    }

    async fn repo() -> InMemoryRepository {
        let repo = InMemoryRepository::with_defaults().unwrap();
        repo.save_currency(&jpy()).await.unwrap();
        repo
    }

    async fn validate(
        income: Option<&str>,
        currency: Option<&str>,
    ) -> Result<ValidatedIncome, CalculationError> {
        let repo = repo().await;
        IncomeValidator::new("NZD")
            .validate(&repo, income, currency)
            .await
    }

    // =========================================================================
    // parse_income tests
    // =========================================================================

    fn decimal(raw: &str) -> Option<Decimal> {
        parse_income(raw).ok().and_then(|parsed| parsed.to_decimal())
    }

    #[test]
    fn parse_income_accepts_plain_numerals() {
        assert_eq!(decimal("10000"), Some(dec!(10000)));
        assert_eq!(decimal("15600.01"), Some(dec!(15600.01)));
        assert_eq!(decimal(" 42 "), Some(dec!(42)));
        assert_eq!(decimal("+5"), Some(dec!(5)));
        assert_eq!(decimal(".5"), Some(dec!(0.5)));
        assert_eq!(decimal("5."), Some(dec!(5)));
        assert_eq!(decimal("-10"), Some(dec!(-10)));
    }

    #[test]
    fn parse_income_rejects_non_numerals() {
        for raw in ["12x.34", "abc", "1e5", "1,000", "$10", ".", "-", "1.2.3", "١٢"] {
            assert_eq!(
                parse_income(raw),
                Err(CalculationError::InvalidFormat {
                    provided: raw.to_string()
                }),
                "{raw}"
            );
        }
    }

    #[test]
    fn parse_income_tolerates_insignificant_zeros() {
        let raw = format!("{}1.5{}", "0".repeat(40), "0".repeat(40));

        assert_eq!(decimal(&raw), Some(dec!(1.5)));
    }

    #[test]
    fn parse_income_keeps_sign_of_oversized_numerals() {
        let parsed = parse_income(&format!("-{}", "9".repeat(40))).unwrap();

        assert!(parsed.is_negative());
        assert_eq!(parsed.to_decimal(), None);
    }

    #[test]
    fn negative_zero_is_not_negative() {
        for raw in ["-0", "-0.00", "-000"] {
            let parsed = parse_income(raw).unwrap();
            assert!(!parsed.is_negative(), "{raw}");
            assert_eq!(parsed.to_decimal(), Some(Decimal::ZERO), "{raw}");
        }
    }

    #[test]
    fn fractional_digits_ignores_trailing_zeros() {
        let digits = |raw: &str| parse_income(raw).unwrap().fractional_digits();

        assert_eq!(digits("10.00"), 0);
        assert_eq!(digits("10.50"), 1);
        assert_eq!(digits("10.123"), 3);
        assert_eq!(digits("100"), 0);
        assert_eq!(digits(&format!("0.{}1", "0".repeat(28))), 29);
    }

    // =========================================================================
    // validate tests
    // =========================================================================

    #[tokio::test]
    async fn valid_income_is_converted_to_minor_units() {
        let validated = validate(Some("15600.01"), None).await.unwrap();

        assert_eq!(validated.raw, "15600.01");
        assert_eq!(validated.minor_units, 1_560_001);
        assert_eq!(validated.currency.code, "NZD");
    }

    #[tokio::test]
    async fn missing_or_blank_income_is_rejected() {
        assert_eq!(
            validate(None, None).await,
            Err(CalculationError::MissingParameter)
        );
        assert_eq!(
            validate(Some("   "), None).await,
            Err(CalculationError::MissingParameter)
        );
    }

    #[tokio::test]
    async fn negative_income_is_rejected() {
        assert_eq!(
            validate(Some("-10"), None).await,
            Err(CalculationError::NegativeIncome {
                provided: "-10".to_string()
            })
        );
    }

    #[tokio::test]
    async fn negative_zero_is_zero() {
        let validated = validate(Some("-0"), None).await.unwrap();

        assert_eq!(validated.minor_units, 0);
    }

    #[tokio::test]
    async fn currency_is_trimmed_and_case_insensitive() {
        let validated = validate(Some("100"), Some(" jpy ")).await.unwrap();

        assert_eq!(validated.currency.code, "JPY");
        assert_eq!(validated.minor_units, 100);
    }

    #[tokio::test]
    async fn blank_currency_falls_back_to_default() {
        let validated = validate(Some("100"), Some("")).await.unwrap();

        assert_eq!(validated.currency.code, "NZD");
        assert_eq!(validated.minor_units, 100_00);
    }

    #[tokio::test]
    async fn unknown_currency_is_rejected() {
        assert_eq!(
            validate(Some("100"), Some(" xxx ")).await,
            Err(CalculationError::UnknownCurrency {
                code: "XXX".to_string(),
                provided: "xxx".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn too_many_decimal_places_is_rejected() {
        assert_eq!(
            validate(Some("10.123"), None).await,
            Err(CalculationError::TooManyDecimalPlaces {
                actual: 3,
                allowed: 2,
                provided: "10.123".to_string()
            })
        );
        assert_eq!(
            validate(Some("10.5"), Some("JPY")).await,
            Err(CalculationError::TooManyDecimalPlaces {
                actual: 1,
                allowed: 0,
                provided: "10.5".to_string()
            })
        );
    }

    #[tokio::test]
    async fn trailing_zeros_do_not_count_as_decimal_places() {
        let validated = validate(Some("10.000"), None).await.unwrap();
        assert_eq!(validated.minor_units, 10_00);

        let validated = validate(Some("10.0"), Some("JPY")).await.unwrap();
        assert_eq!(validated.minor_units, 10);
    }

    #[tokio::test]
    async fn income_too_large_for_minor_units_is_rejected() {
        let raw = "99999999999999999999";

        assert_eq!(
            validate(Some(raw), None).await,
            Err(CalculationError::IncomeOutOfRange {
                provided: raw.to_string()
            })
        );
    }

    #[tokio::test]
    async fn first_violated_rule_wins() {
        // Negative and unknown currency: negativity is checked first.
        assert_eq!(
            validate(Some("-1.234"), Some("XXX")).await,
            Err(CalculationError::NegativeIncome {
                provided: "-1.234".to_string()
            })
        );
        // Unknown currency is reported before decimal places.
        assert_eq!(
            validate(Some("1.234"), Some("XXX")).await,
            Err(CalculationError::UnknownCurrency {
                code: "XXX".to_string(),
                provided: "XXX".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn oversized_negative_income_is_negative() {
        let raw = format!("-{}", "9".repeat(40));

        assert_eq!(
            validate(Some(raw.as_str()), None).await,
            Err(CalculationError::NegativeIncome { provided: raw })
        );
    }

    #[tokio::test]
    async fn excess_precision_beyond_decimal_range_is_too_many_places() {
        let raw = format!("0.{}1", "0".repeat(28));

        assert_eq!(
            validate(Some(raw.as_str()), None).await,
            Err(CalculationError::TooManyDecimalPlaces {
                actual: 29,
                allowed: 2,
                provided: raw.clone(),
            })
        );
        assert_eq!(
            validate(Some(raw.as_str()), Some("XXX")).await,
            Err(CalculationError::UnknownCurrency {
                code: "XXX".to_string(),
                provided: "XXX".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn income_beyond_decimal_range_is_out_of_range() {
        let raw = "9".repeat(40);

        assert_eq!(
            validate(Some(raw.as_str()), None).await,
            Err(CalculationError::IncomeOutOfRange { provided: raw })
        );
    }

    #[test]
    fn default_currency_is_normalized() {
        let validator = IncomeValidator::new(" nzd ");

        assert_eq!(validator.default_currency(), "NZD");
    }
}
