//! Monetary and ratio types.
//!
//! Stakes, fees and payouts are integer [`Amount`]s in the ledger's smallest
//! unit. Intermediate products are widened to `u128` and every computation
//! performs at most one truncating division, so no floating point ever
//! touches a value that moves money.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Price represented as a Decimal for precision.
pub type Price = Decimal;

/// Non-negative quantity in the ledger's smallest currency unit.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(units: u64) -> Self {
        Self(units)
    }

    #[must_use]
    pub const fn units(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Add two amounts, failing on overflow.
    pub fn checked_add(self, other: Self) -> Result<Self, DomainError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(DomainError::ArithmeticOverflow("amount addition"))
    }

    /// Subtract `other`, failing if the result would be negative.
    pub fn checked_sub(self, other: Self) -> Result<Self, DomainError> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(DomainError::ArithmeticOverflow("amount subtraction"))
    }

    /// Compute `floor(self × numerator / denominator)` with a `u128`
    /// intermediate.
    ///
    /// # Errors
    ///
    /// Fails when `denominator` is zero or the quotient does not fit in `u64`.
    pub fn mul_div_floor(self, numerator: Self, denominator: Self) -> Result<Self, DomainError> {
        if denominator.is_zero() {
            return Err(DomainError::ArithmeticOverflow("division by zero"));
        }
        let product = u128::from(self.0) * u128::from(numerator.0);
        let quotient = product / u128::from(denominator.0);
        u64::try_from(quotient)
            .map(Self)
            .map_err(|_| DomainError::ArithmeticOverflow("mul_div"))
    }

    /// Compute `floor(self × bps / 10_000)`. Negative rates are rejected.
    pub fn apply_bps_floor(self, bps: Bps) -> Result<Self, DomainError> {
        let rate = u64::try_from(bps.value())
            .map_err(|_| DomainError::ArithmeticOverflow("negative rate"))?;
        self.mul_div_floor(Self(rate), Self(Bps::SCALE as u64))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Amount {
    fn from(units: u64) -> Self {
        Self(units)
    }
}

/// Signed basis points (1 bp = 0.01%).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Bps(i64);

impl Bps {
    /// Basis points in one whole (100%).
    pub const SCALE: i64 = 10_000;
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(bps: i64) -> Self {
        Self(bps)
    }

    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// A target line, bounded to `[-10000, 10000]`.
    pub fn try_line(bps: i64) -> Result<Self, DomainError> {
        if bps.abs() > Self::SCALE {
            return Err(DomainError::LineOutOfRange { bps });
        }
        Ok(Self(bps))
    }

    /// A confidence ratio, bounded to `[0, 10000]`.
    pub fn try_confidence(bps: i64) -> Result<Self, DomainError> {
        if !(0..=Self::SCALE).contains(&bps) {
            return Err(DomainError::ConfidenceOutOfRange { bps });
        }
        Ok(Self(bps))
    }

    /// Convert a `[0, 1]` fraction to basis points, rounding to nearest.
    pub fn from_fraction(fraction: f64) -> Result<Self, DomainError> {
        if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
            return Err(DomainError::ConfidenceOutOfRange {
                bps: (fraction * Self::SCALE as f64) as i64,
            });
        }
        Ok(Self((fraction * Self::SCALE as f64).round() as i64))
    }

    /// The ratio as a float, for curve rendering only.
    #[must_use]
    pub fn as_fraction(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    #[must_use]
    pub fn as_decimal(self) -> Decimal {
        Decimal::from(self.0)
    }
}

impl fmt::Display for Bps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn fee_is_floored() {
        let fee = Amount::new(5_000_000_000)
            .apply_bps_floor(Bps::new(75))
            .unwrap();
        assert_eq!(fee, Amount::new(37_500_000));

        let tiny = Amount::new(133).apply_bps_floor(Bps::new(75)).unwrap();
        assert_eq!(tiny, Amount::ZERO);
    }

    #[test]
    fn mul_div_uses_wide_intermediate() {
        let net = Amount::new(4_962_500_000);
        let total = Amount::new(63_000_000_000);
        let winning = Amount::new(34_000_000_000);
        assert_eq!(
            net.mul_div_floor(total, winning).unwrap(),
            Amount::new(9_195_220_588)
        );
    }

    #[test]
    fn mul_div_rejects_zero_denominator() {
        let err = Amount::new(1).mul_div_floor(Amount::new(1), Amount::ZERO);
        assert!(matches!(err, Err(DomainError::ArithmeticOverflow(_))));
    }

    #[test]
    fn mul_div_reports_overflow() {
        let err = Amount::new(u64::MAX).mul_div_floor(Amount::new(u64::MAX), Amount::new(1));
        assert!(err.is_err());
    }

    #[test]
    fn checked_sub_rejects_negative() {
        assert!(Amount::new(1).checked_sub(Amount::new(2)).is_err());
        assert_eq!(
            Amount::new(3).checked_sub(Amount::new(2)).unwrap(),
            Amount::new(1)
        );
    }

    #[test]
    fn line_bounds() {
        assert!(Bps::try_line(10_000).is_ok());
        assert!(Bps::try_line(-10_000).is_ok());
        assert!(Bps::try_line(10_001).is_err());
    }

    #[test]
    fn confidence_bounds() {
        assert!(Bps::try_confidence(0).is_ok());
        assert!(Bps::try_confidence(-1).is_err());
        assert_eq!(Bps::from_fraction(0.72).unwrap(), Bps::new(7_200));
        assert!(Bps::from_fraction(1.5).is_err());
    }

    #[test]
    fn bps_decimal_view() {
        assert_eq!(Bps::new(-250).as_decimal(), dec!(-250));
    }
}
