//! Built-in configuration: the default currency and its bracket schedule.
//!
//! The SQLite backend ships the same data as `seeds/001_nzd.sql`; the
//! in-memory backend is seeded from here.

use rust_decimal::Decimal;

use super::{Currency, NewTaxBracket};

/// Currency used when a request does not name one.
pub const DEFAULT_CURRENCY_CODE: &str = "NZD";

pub fn nzd() -> Currency {
    Currency {
        code: DEFAULT_CURRENCY_CODE.to_string(),
        name: "New Zealand Dollar".to_string(),
        symbol: "$".to_string(),
        divisor: 100,
    }
}

/// NZ individual income tax rates, in cents.
pub fn nzd_brackets() -> Vec<NewTaxBracket> {
    [
        (0, Some(15_600_00), Decimal::new(105, 3)),
        (15_601_00, Some(53_500_00), Decimal::new(175, 3)),
        (53_501_00, Some(78_100_00), Decimal::new(30, 2)),
        (78_101_00, Some(180_000_00), Decimal::new(33, 2)),
        (180_001_00, None, Decimal::new(39, 2)),
    ]
    .into_iter()
    .map(|(lower_cents, upper_cents, rate)| NewTaxBracket {
        currency_code: DEFAULT_CURRENCY_CODE.to_string(),
        lower_cents,
        upper_cents,
        rate,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(nzd().validate().is_ok());
        for bracket in nzd_brackets() {
            assert!(bracket.validate().is_ok(), "{bracket:?}");
        }
    }

    #[test]
    fn brackets_are_ordered_and_open_at_the_top() {
        let brackets = nzd_brackets();

        assert!(brackets.windows(2).all(|w| w[0].lower_cents < w[1].lower_cents));
        assert_eq!(brackets.last().and_then(|b| b.upper_cents), None);
    }
}
