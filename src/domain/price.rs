//! Recorded price observations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::PoolId;
use super::money::Price;

/// A price sampled for a pool's asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub pool_id: PoolId,
    pub ts: DateTime<Utc>,
    pub price: Price,
    pub source: String,
}

/// Earliest point in a history; the resolution start price.
#[must_use]
pub fn earliest(history: &[PricePoint]) -> Option<&PricePoint> {
    history.iter().min_by_key(|p| p.ts)
}

/// Latest point at or before `at`.
#[must_use]
pub fn as_of(history: &[PricePoint], at: DateTime<Utc>) -> Option<&PricePoint> {
    history
        .iter()
        .filter(|p| p.ts <= at)
        .max_by_key(|p| p.ts)
}

/// Most recent point in a history.
#[must_use]
pub fn latest(history: &[PricePoint]) -> Option<&PricePoint> {
    history.iter().max_by_key(|p| p.ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn history() -> Vec<PricePoint> {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        [dec!(0.000022), dec!(0.000021), dec!(0.0000215)]
            .into_iter()
            .enumerate()
            .map(|(i, price)| PricePoint {
                pool_id: PoolId::new(1),
                ts: t0 + Duration::minutes([10, 0, 20][i]),
                price,
                source: "jupiter".into(),
            })
            .collect()
    }

    #[test]
    fn earliest_ignores_insertion_order() {
        assert_eq!(earliest(&history()).unwrap().price, dec!(0.000021));
    }

    #[test]
    fn as_of_picks_last_point_not_after() {
        let h = history();
        let at = h[1].ts + Duration::minutes(15);
        assert_eq!(as_of(&h, at).unwrap().price, dec!(0.000022));
        assert!(as_of(&h, h[1].ts - Duration::seconds(1)).is_none());
        assert_eq!(latest(&h).unwrap().price, dec!(0.0000215));
    }
}
