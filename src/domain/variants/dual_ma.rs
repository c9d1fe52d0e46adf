//! Dual moving-average crossover.
//!
//! Entry: the short MA crossed above the long MA on bar i-1 (and, when a bias
//! threshold is set, the close sat more than that many percent above the long
//! MA on bar i-1); enter long at open[i].
//! Exit: mid price (open + close) / 2 below the short MA, filled at the close.

use crate::domain::indicator::bias::calculate_bias;
use crate::domain::indicator::signal::cross_signal;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{above, below, IndicatorSeries};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::position::{PositionState, SimState};
use crate::domain::strategy::DualMaParams;

use super::BarRules;

pub struct DualMaRules {
    short: IndicatorSeries,
    cross: Vec<i8>,
    bias_filter: Option<(IndicatorSeries, f64)>,
}

impl DualMaRules {
    pub fn new(bars: &[OhlcvBar], params: &DualMaParams) -> Self {
        let short = calculate_sma(bars, params.short_ma_period);
        let long = calculate_sma(bars, params.long_ma_period);
        let cross = cross_signal(&short, &long);
        let bias_filter = params
            .bias_threshold
            .map(|t| (calculate_bias(bars, params.long_ma_period), t));

        Self {
            short,
            cross,
            bias_filter,
        }
    }
}

impl BarRules for DualMaRules {
    fn first_bar(&self) -> usize {
        1
    }

    fn exit_price(&self, bars: &[OhlcvBar], i: usize, state: &SimState) -> Option<f64> {
        let bar = &bars[i];
        (state.position == PositionState::Long
            && below(Some(bar.mid_price()), self.short.get(i)))
        .then_some(bar.close)
    }

    fn entry(&self, bars: &[OhlcvBar], i: usize) -> Option<(PositionState, f64)> {
        if i == 0 || self.cross.get(i - 1) != Some(&1) {
            return None;
        }
        if let Some((bias, threshold)) = &self.bias_filter {
            if !above(bias.get(i - 1), Some(*threshold)) {
                return None;
            }
        }
        Some((PositionState::Long, bars[i].open))
    }
}
