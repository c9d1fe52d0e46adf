//! Bollinger breakout with a next-open drop filter.
//!
//! Stage 1 (bar i-1): close above the upper band.
//! Stage 2 (bar i): open[i] >= close[i-1] * (1 - drop_threshold * gain[i-1]),
//! i.e. the gap down from the signal close is no larger than a fraction of the
//! signal bar's own gain. Enter long at open[i].
//! Exit: close back below the upper band, filled at the close.

use crate::domain::indicator::bollinger::{calculate_bollinger, BollingerBands};
use crate::domain::indicator::prior_gain::calculate_prior_gain;
use crate::domain::indicator::{above, below, IndicatorSeries};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::position::{PositionState, SimState};
use crate::domain::strategy::BreakoutParams;

use super::BarRules;

pub struct BreakoutRules {
    bands: BollingerBands,
    prior_gain: IndicatorSeries,
    drop_threshold: f64,
}

impl BreakoutRules {
    pub fn new(bars: &[OhlcvBar], params: &BreakoutParams) -> Self {
        Self {
            bands: calculate_bollinger(bars, params.bb_period, params.bb_std),
            prior_gain: calculate_prior_gain(bars),
            drop_threshold: params.drop_threshold,
        }
    }
}

impl BarRules for BreakoutRules {
    fn first_bar(&self) -> usize {
        1
    }

    fn exit_price(&self, bars: &[OhlcvBar], i: usize, state: &SimState) -> Option<f64> {
        let close = bars[i].close;
        (state.position == PositionState::Long && below(Some(close), self.bands.upper_at(i)))
            .then_some(close)
    }

    fn entry(&self, bars: &[OhlcvBar], i: usize) -> Option<(PositionState, f64)> {
        if i == 0 {
            return None;
        }
        let signal = &bars[i - 1];
        if !above(Some(signal.close), self.bands.upper_at(i - 1)) {
            return None;
        }

        let gain = self.prior_gain.get(i - 1)?;
        let floor = signal.close * (1.0 - self.drop_threshold * gain);
        let open = bars[i].open;
        (open >= floor).then_some((PositionState::Long, open))
    }
}
