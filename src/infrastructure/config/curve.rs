//! Prediction curve configuration.

use serde::Deserialize;

use crate::domain::curve::CurveParams;

/// `[curve]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CurveConfig {
    #[serde(default = "default_points")]
    pub points: usize,
    #[serde(default = "default_max_swing")]
    pub max_swing: f64,
    #[serde(default = "default_neutral_trend")]
    pub neutral_trend: f64,
    #[serde(default = "default_oscillation")]
    pub oscillation: f64,
}

const fn default_points() -> usize {
    24
}

const fn default_max_swing() -> f64 {
    0.15
}

const fn default_neutral_trend() -> f64 {
    0.025
}

const fn default_oscillation() -> f64 {
    0.01
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            points: default_points(),
            max_swing: default_max_swing(),
            neutral_trend: default_neutral_trend(),
            oscillation: default_oscillation(),
        }
    }
}

impl From<&CurveConfig> for CurveParams {
    fn from(config: &CurveConfig) -> Self {
        Self {
            points: config.points,
            max_swing: config.max_swing,
            neutral_trend: config.neutral_trend,
            oscillation: config.oscillation,
        }
    }
}
