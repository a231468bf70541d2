//! Prediction curve rendering.
//!
//! The curve is display data derived from community sentiment and the
//! declared confidence. It is the only place floating point is used; nothing
//! here feeds settlement.

use std::f64::consts::PI;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::money::{Amount, Bps, Price};
use super::proof::hash_bytes;

/// Shape parameters of the curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveParams {
    pub points: usize,
    /// Largest fractional move the target may express.
    pub max_swing: f64,
    /// Endpoint drift used when no stake has been placed.
    pub neutral_trend: f64,
    /// Amplitude of the cosmetic oscillation as a fraction of price.
    pub oscillation: f64,
}

impl Default for CurveParams {
    fn default() -> Self {
        Self {
            points: 24,
            max_swing: 0.15,
            neutral_trend: 0.025,
            oscillation: 0.01,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CurveInput {
    pub start_price: Price,
    pub current_price: Price,
    pub total_over: Amount,
    pub total_under: Amount,
    pub confidence: Bps,
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub ts: DateTime<Utc>,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionCurve {
    /// Sentiment in `[-1, 1]`; zero for a neutral curve.
    pub bias: f64,
    pub target: f64,
    pub neutral: bool,
    pub points: Vec<CurvePoint>,
    /// Hash over the inputs and rendered points.
    pub commitment: String,
}

/// Render a prediction curve with `params.points + 1` evenly spaced points.
///
/// # Errors
///
/// Fails when the point count is zero, the window is empty, or a price is
/// not strictly positive.
pub fn generate(input: &CurveInput, params: &CurveParams) -> Result<PredictionCurve, DomainError> {
    if params.points == 0 {
        return Err(DomainError::InvalidCurvePoints(params.points));
    }
    if input.end_ts <= input.start_ts {
        return Err(DomainError::InvalidTimestamps);
    }
    let start = positive_f64(input.start_price)?;
    let current = positive_f64(input.current_price)?;

    let over = input.total_over.units() as f64;
    let under = input.total_under.units() as f64;
    let total = over + under;
    let n = params.points;

    let (bias, target, neutral) = if total == 0.0 {
        (0.0, start * (1.0 + params.neutral_trend), true)
    } else {
        let bias = (over - under) / total;
        let swing = bias * input.confidence.as_fraction() * params.max_swing;
        (bias, current * (1.0 + swing), false)
    };

    let span = (input.end_ts - input.start_ts).num_seconds();
    let points = (0..=n)
        .map(|i| {
            let progress = i as f64 / n as f64;
            let price = if neutral {
                let wave = (progress * PI * 3.0).sin() * (params.oscillation / 2.0) * start;
                start + (target - start) * progress + wave
            } else {
                let wave = (progress * PI * 4.0).sin() * params.oscillation * current;
                start + (target - start) * smoothstep(progress) + wave
            };
            let offset = span * i as i64 / n as i64;
            CurvePoint {
                ts: input.start_ts + Duration::seconds(offset),
                price,
            }
        })
        .collect::<Vec<_>>();

    let commitment = commit(input, params, &points);
    Ok(PredictionCurve {
        bias,
        target,
        neutral,
        points,
        commitment,
    })
}

fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn positive_f64(price: Price) -> Result<f64, DomainError> {
    match price.to_f64() {
        Some(p) if p > 0.0 && p.is_finite() => Ok(p),
        _ => Err(DomainError::InvalidPrice(price.to_string())),
    }
}

fn commit(input: &CurveInput, params: &CurveParams, points: &[CurvePoint]) -> String {
    let mut preimage = format!(
        "start={}|current={}|over={}|under={}|confidence={}|window={}..{}|n={}|swing={:.12}|trend={:.12}|osc={:.12}",
        input.start_price.normalize(),
        input.current_price.normalize(),
        input.total_over,
        input.total_under,
        input.confidence,
        input.start_ts.timestamp(),
        input.end_ts.timestamp(),
        params.points,
        params.max_swing,
        params.neutral_trend,
        params.oscillation,
    );
    for point in points {
        preimage.push_str(&format!("|{}:{:.12}", point.ts.timestamp(), point.price));
    }
    hash_bytes(preimage.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn input(over: u64, under: u64) -> CurveInput {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        CurveInput {
            start_price: dec!(2.0),
            current_price: dec!(2.0),
            total_over: Amount::new(over),
            total_under: Amount::new(under),
            confidence: Bps::new(10_000),
            start_ts: start,
            end_ts: start + Duration::hours(24),
        }
    }

    #[test]
    fn emits_n_plus_one_evenly_spaced_points() {
        let curve = generate(&input(1, 1), &CurveParams::default()).unwrap();
        assert_eq!(curve.points.len(), 25);
        assert_eq!(curve.points[1].ts - curve.points[0].ts, Duration::hours(1));
        assert_eq!(curve.points[24].ts, input(1, 1).end_ts);
    }

    #[test]
    fn neutral_curve_trends_up() {
        let curve = generate(&input(0, 0), &CurveParams::default()).unwrap();
        assert!(curve.neutral);
        assert!((curve.target - 2.05).abs() < 1e-12);
        let last = curve.points.last().unwrap().price;
        assert!((last - 2.05).abs() < 1e-9);
    }

    #[test]
    fn all_over_swings_to_max() {
        let curve = generate(&input(100, 0), &CurveParams::default()).unwrap();
        assert!((curve.bias - 1.0).abs() < 1e-12);
        assert!((curve.target - 2.3).abs() < 1e-12);
    }

    #[test]
    fn curve_is_deterministic_and_committed() {
        let a = generate(&input(30, 10), &CurveParams::default()).unwrap();
        let b = generate(&input(30, 10), &CurveParams::default()).unwrap();
        assert_eq!(a.commitment, b.commitment);
        let c = generate(&input(31, 10), &CurveParams::default()).unwrap();
        assert_ne!(a.commitment, c.commitment);
    }

    #[test]
    fn starts_at_start_price() {
        let curve = generate(&input(30, 10), &CurveParams::default()).unwrap();
        assert!((curve.points[0].price - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_zero_points() {
        let params = CurveParams {
            points: 0,
            ..CurveParams::default()
        };
        assert_eq!(
            generate(&input(1, 1), &params),
            Err(DomainError::InvalidCurvePoints(0))
        );
    }
}
