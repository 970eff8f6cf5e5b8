//! Per-class pricing.
//!
//! A course carries a single price for all of its classes. The price shown on
//! each generated class is the even split plus a flat 10% surcharge.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

/// Multiplier applied to the even per-class split.
pub const CLASS_SURCHARGE: Decimal = dec!(1.10);

/// Largest course price accepted from organisers.
pub const MAX_COURSE_PRICE: Decimal = dec!(1000000);

/// Round to `places` decimal places, halves away from zero.
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

/// Price of a single class: `round2(total / class_count * 1.10)`.
///
/// Returns zero when `class_count` is zero and `None` when the surcharge
/// overflows the decimal range.
pub fn price_per_class(total: Decimal, class_count: u32) -> Option<Decimal> {
    if class_count == 0 {
        return Some(Decimal::ZERO);
    }
    let split = total.checked_div(Decimal::from(class_count))?;
    let price = split.checked_mul(CLASS_SURCHARGE)?;
    Some(round_money(price, 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_per_class_salsa() {
        assert_eq!(price_per_class(dec!(180), 7), Some(dec!(28.29)));
    }

    #[test]
    fn test_price_per_class_rounds_half_up() {
        // 150 / 8 * 1.10 = 20.625 exactly
        assert_eq!(price_per_class(dec!(150), 8), Some(dec!(20.63)));
    }

    #[test]
    fn test_price_per_class_even_split() {
        assert_eq!(price_per_class(dec!(220), 10), Some(dec!(24.20)));
        assert_eq!(price_per_class(dec!(180), 5), Some(dec!(39.60)));
    }

    #[test]
    fn test_price_per_class_zero_count() {
        assert_eq!(price_per_class(dec!(180), 0), Some(Decimal::ZERO));
    }

    #[test]
    fn test_price_per_class_overflow_is_none() {
        assert_eq!(price_per_class(Decimal::MAX, 1), None);
        assert_eq!(price_per_class(dec!(1000000), 1), Some(dec!(1100000)));
    }

    #[test]
    fn test_round_money() {
        assert_eq!(round_money(dec!(2.5), 0), dec!(3));
        assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
        assert_eq!(round_money(dec!(-1.005), 2), dec!(-1.01));
    }
}
