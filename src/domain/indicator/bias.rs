//! Bias: distance of the close from its n-period moving average, in percent.
//!
//! BIAS(n)[i] = (C[i] - SMA(n)[i]) / SMA(n)[i] * 100

use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_bias(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let sma = calculate_sma(bars, period);
    let values = bars
        .iter()
        .zip(&sma.values)
        .map(|(bar, ma)| match ma {
            Some(ma) if *ma != 0.0 => Some((bar.close - ma) / ma * 100.0),
            _ => None,
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Bias(period),
        values,
    }
}
