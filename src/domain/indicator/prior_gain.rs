//! Prior-bar percentage gain.
//!
//! GAIN[i] = (C[i] - C[i-1]) / C[i-1]
//! Undefined at i = 0 and wherever C[i-1] == 0.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_prior_gain(bars: &[OhlcvBar]) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        let value = if i == 0 {
            None
        } else {
            let prev_close = bars[i - 1].close;
            if prev_close == 0.0 {
                None
            } else {
                Some((bars[i].close - prev_close) / prev_close)
            }
        };
        values.push(value);
    }

    IndicatorSeries {
        indicator_type: IndicatorType::PriorGain,
        values,
    }
}
