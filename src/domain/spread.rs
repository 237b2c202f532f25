//! Spread evaluation between the two venues.

use rust_decimal::Decimal;

/// Outcome of evaluating the price spread for one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadCheck {
    /// Absolute price difference, sell side minus buy side.
    pub spread: Decimal,
    /// Spread as a percentage of the buy-side price.
    pub spread_percent: Decimal,
    /// True when the spread percentage meets the configured minimum.
    pub opportunity: bool,
}

/// Evaluates the directional spread between the sell-side and buy-side
/// prices.
///
/// Only the case `sell_price > buy_price` is considered; the reverse
/// direction is never evaluated, by policy. Returns `None` when the
/// direction does not hold (or the buy price is not positive), leaving
/// `max_spread` untouched. Otherwise updates `max_spread` to the highest
/// spread percentage seen so far.
pub fn evaluate(
    sell_price: Decimal,
    buy_price: Decimal,
    min_spread_percent: Decimal,
    max_spread: &mut Decimal,
) -> Option<SpreadCheck> {
    if buy_price <= Decimal::ZERO || sell_price <= buy_price {
        return None;
    }

    let spread = sell_price - buy_price;
    let spread_percent = spread / buy_price * Decimal::ONE_HUNDRED;

    if spread_percent > *max_spread {
        *max_spread = spread_percent;
    }

    Some(SpreadCheck {
        spread,
        spread_percent,
        opportunity: spread_percent >= min_spread_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_spread_math() {
        let mut max = Decimal::ZERO;
        let check = evaluate(d("50100"), d("50000"), d("0.005"), &mut max).unwrap();

        assert_eq!(check.spread, d("100"));
        assert_eq!(check.spread_percent, d("0.2"));
        assert!(check.opportunity);
        assert_eq!(max, d("0.2"));
    }

    #[test]
    fn test_below_threshold_is_not_an_opportunity() {
        let mut max = Decimal::ZERO;
        let check = evaluate(d("50001"), d("50000"), d("0.005"), &mut max).unwrap();

        assert_eq!(check.spread_percent, d("0.002"));
        assert!(!check.opportunity);
        // Max tracker still advances on any positive spread.
        assert_eq!(max, d("0.002"));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut max = Decimal::ZERO;
        let check = evaluate(d("50100"), d("50000"), d("0.2"), &mut max).unwrap();
        assert!(check.opportunity);
    }

    #[test]
    fn test_reverse_direction_is_never_evaluated() {
        let mut max = d("0.3");
        let check = evaluate(d("50000"), d("50010"), d("0.005"), &mut max);

        assert!(check.is_none());
        assert_eq!(max, d("0.3"));
    }

    #[test]
    fn test_equal_prices_are_no_opportunity() {
        let mut max = Decimal::ZERO;
        assert!(evaluate(d("50000"), d("50000"), d("0.005"), &mut max).is_none());
        assert_eq!(max, Decimal::ZERO);
    }

    #[test]
    fn test_max_spread_is_monotonic() {
        let mut max = Decimal::ZERO;

        evaluate(d("50100"), d("50000"), d("0.005"), &mut max);
        assert_eq!(max, d("0.2"));

        // A smaller spread must not lower the tracker.
        evaluate(d("50050"), d("50000"), d("0.005"), &mut max);
        assert_eq!(max, d("0.2"));

        evaluate(d("50200"), d("50000"), d("0.005"), &mut max);
        assert_eq!(max, d("0.4"));
    }

    #[test]
    fn test_non_positive_buy_price_is_rejected() {
        let mut max = Decimal::ZERO;
        assert!(evaluate(d("1"), Decimal::ZERO, d("0.005"), &mut max).is_none());
        assert_eq!(max, Decimal::ZERO);
    }
}
