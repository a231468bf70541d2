//! Outcome determination from measured prices.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::error::DomainError;
use super::money::{Bps, Price};
use super::pool::Winner;

/// Price change from `start` to `end` in basis points, rounded half away
/// from zero.
///
/// # Errors
///
/// Fails on a zero start price, a negative price, or a change too large to
/// represent.
pub fn price_change_bps(start: Price, end: Price) -> Result<i64, DomainError> {
    if start.is_zero() {
        return Err(DomainError::ZeroStartPrice);
    }
    if start.is_sign_negative() {
        return Err(DomainError::InvalidPrice(start.to_string()));
    }
    if end.is_sign_negative() {
        return Err(DomainError::InvalidPrice(end.to_string()));
    }

    let scale = Decimal::from(Bps::SCALE);
    let change = end
        .checked_sub(start)
        .and_then(|delta| delta.checked_mul(scale))
        .and_then(|scaled| scaled.checked_div(start))
        .ok_or(DomainError::ArithmeticOverflow("price change"))?;

    change
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DomainError::ArithmeticOverflow("price change"))
}

/// Decide the winner from a measured change against the pool's line.
///
/// Changes within `void_band` of the line are too close to call.
#[must_use]
pub fn decide_winner(change_bps: i64, line: Bps, void_band: Bps) -> Winner {
    let distance = (i128::from(change_bps) - i128::from(line.value())).abs();
    if distance < i128::from(void_band.value()) {
        Winner::Void
    } else if change_bps > line.value() {
        Winner::Over
    } else {
        Winner::Under
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn resolves_over_on_reference_example() {
        let change = price_change_bps(dec!(0.000021), dec!(0.0000220)).unwrap();
        assert_eq!(change, 476);
        assert_eq!(decide_winner(change, Bps::new(300), Bps::new(1)), Winner::Over);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        // +0.5 bps and -0.5 bps
        assert_eq!(price_change_bps(dec!(20000), dec!(20001)).unwrap(), 1);
        assert_eq!(price_change_bps(dec!(20000), dec!(19999)).unwrap(), -1);
    }

    #[test]
    fn exact_line_is_void() {
        assert_eq!(decide_winner(300, Bps::new(300), Bps::new(1)), Winner::Void);
        assert_eq!(decide_winner(301, Bps::new(300), Bps::new(1)), Winner::Over);
        assert_eq!(decide_winner(299, Bps::new(300), Bps::new(1)), Winner::Under);
    }

    #[test]
    fn wider_band_voids_near_misses() {
        assert_eq!(decide_winner(304, Bps::new(300), Bps::new(5)), Winner::Void);
        assert_eq!(decide_winner(305, Bps::new(300), Bps::new(5)), Winner::Over);
    }

    #[test]
    fn zero_band_never_voids() {
        assert_eq!(decide_winner(0, Bps::ZERO, Bps::ZERO), Winner::Under);
    }

    #[test]
    fn negative_line_counts_drops() {
        let change = price_change_bps(dec!(1.00), dec!(0.97)).unwrap();
        assert_eq!(change, -300);
        assert_eq!(decide_winner(change, Bps::new(-250), Bps::new(1)), Winner::Under);
    }

    #[test]
    fn zero_start_price_is_rejected() {
        assert_eq!(
            price_change_bps(Decimal::ZERO, dec!(1)),
            Err(DomainError::ZeroStartPrice)
        );
    }
}
