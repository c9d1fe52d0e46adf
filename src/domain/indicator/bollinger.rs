//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Warmup: first (period-1) bars are undefined.

use crate::domain::indicator::sma::rolling_mean;
use crate::domain::indicator::stddev::rolling_stddev;
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub period: usize,
    pub multiplier: f64,
    pub middle: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

impl BollingerBands {
    pub fn middle_at(&self, index: usize) -> Option<f64> {
        self.middle.get(index).copied().flatten()
    }

    pub fn upper_at(&self, index: usize) -> Option<f64> {
        self.upper.get(index).copied().flatten()
    }

    pub fn lower_at(&self, index: usize) -> Option<f64> {
        self.lower.get(index).copied().flatten()
    }
}

pub fn calculate_bollinger(bars: &[OhlcvBar], period: usize, multiplier: f64) -> BollingerBands {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let middle = rolling_mean(&closes, period);
    let stddev = rolling_stddev(&closes, period);

    let (upper, lower) = middle
        .iter()
        .zip(&stddev)
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => (Some(m + multiplier * s), Some(m - multiplier * s)),
            _ => (None, None),
        })
        .unzip();

    BollingerBands {
        period,
        multiplier,
        middle,
        upper,
        lower,
    }
}
