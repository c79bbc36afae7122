//! Common utility functions for tax calculations.
//!
//! Rounding and rate formatting shared by the bracket engine, the currency
//! model and the response builders.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to `dp` decimal places using half-up rounding.
///
/// Values exactly on the midpoint are rounded away from zero, so `0.5`
/// becomes `1` at zero places. This is conventional currency rounding,
/// not banker's rounding.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454), 2), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455), 2), dec!(123.46));
/// assert_eq!(round_half_up(dec!(0.5), 0), dec!(1));
/// assert_eq!(round_half_up(dec!(-2.5), 0), dec!(-3)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Renders a bracket rate as its shortest exact decimal string.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::format_rate;
///
/// assert_eq!(format_rate(dec!(0.105)), "0.105");
/// assert_eq!(format_rate(dec!(0.30)), "0.3");
/// ```
pub fn format_rate(rate: Decimal) -> String {
    rate.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_half_up tests
    // =========================================================================

    #[test]
    fn round_half_up_rounds_down_below_midpoint() {
        assert_eq!(round_half_up(dec!(123.454), 2), dec!(123.45));
        assert_eq!(round_half_up(dec!(0.49), 0), dec!(0));
    }

    #[test]
    fn round_half_up_rounds_up_at_midpoint() {
        assert_eq!(round_half_up(dec!(123.455), 2), dec!(123.46));
        assert_eq!(round_half_up(dec!(0.5), 0), dec!(1));
        assert_eq!(round_half_up(dec!(2.5), 0), dec!(3));
    }

    #[test]
    fn round_half_up_rounds_up_above_midpoint() {
        assert_eq!(round_half_up(dec!(123.456), 2), dec!(123.46));
    }

    #[test]
    fn round_half_up_handles_negative_values() {
        assert_eq!(round_half_up(dec!(-123.455), 2), dec!(-123.46));
        assert_eq!(round_half_up(dec!(-0.5), 0), dec!(-1));
    }

    #[test]
    fn round_half_up_preserves_already_rounded_values() {
        assert_eq!(round_half_up(dec!(663250), 0), dec!(663250));
    }

    #[test]
    fn round_half_up_handles_zero() {
        assert_eq!(round_half_up(dec!(0.00), 0), dec!(0));
    }

    #[test]
    fn round_half_up_handles_small_values() {
        assert_eq!(round_half_up(dec!(0.175), 0), dec!(0));
    }

    // =========================================================================
    // format_rate tests
    // =========================================================================

    #[test]
    fn format_rate_strips_trailing_zeros() {
        assert_eq!(format_rate(dec!(0.30)), "0.3");
        assert_eq!(format_rate(dec!(0.390)), "0.39");
    }

    #[test]
    fn format_rate_keeps_significant_digits() {
        assert_eq!(format_rate(dec!(0.105)), "0.105");
        assert_eq!(format_rate(dec!(0.175)), "0.175");
    }

    #[test]
    fn format_rate_never_uses_exponent() {
        assert_eq!(format_rate(dec!(0.0001)), "0.0001");
        assert_eq!(format_rate(dec!(1)), "1");
    }
}
