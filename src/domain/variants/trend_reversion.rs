//! Trend-filtered Bollinger mean reversion, long and short.
//!
//! The long MA sets the regime; trades fade band touches in the direction of it.
//!
//! Entry (same bar):
//! - close > MA_long and low <= lower band: long at the lower band
//! - close < MA_long and high >= upper band: short at the upper band
//!
//! A band touch that closes a trade may open the opposite one on the same bar.
//!
//! Exit, stop-loss first:
//! - long stop: open and close both below the lower band, filled at the close
//! - long target: high >= upper band, filled at the upper band
//! - short stop: open and close both above the upper band, filled at the close
//! - short target: low <= lower band, filled at the lower band

use crate::domain::indicator::bollinger::{calculate_bollinger, BollingerBands};
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{above, below, IndicatorSeries};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::position::{PositionState, SimState};
use crate::domain::strategy::TrendReversionParams;

use super::BarRules;

pub struct TrendReversionRules {
    bands: BollingerBands,
    trend: IndicatorSeries,
}

impl TrendReversionRules {
    pub fn new(bars: &[OhlcvBar], params: &TrendReversionParams) -> Self {
        Self {
            bands: calculate_bollinger(bars, params.bb_period, params.bb_std),
            trend: calculate_sma(bars, params.ma_long_period),
        }
    }
}

impl BarRules for TrendReversionRules {
    fn first_bar(&self) -> usize {
        0
    }

    fn exit_price(&self, bars: &[OhlcvBar], i: usize, state: &SimState) -> Option<f64> {
        let bar = &bars[i];
        let upper = self.bands.upper_at(i)?;
        let lower = self.bands.lower_at(i)?;

        match state.position {
            PositionState::Long => {
                if bar.open < lower && bar.close < lower {
                    Some(bar.close)
                } else if bar.high >= upper {
                    Some(upper)
                } else {
                    None
                }
            }
            PositionState::Short => {
                if bar.open > upper && bar.close > upper {
                    Some(bar.close)
                } else if bar.low <= lower {
                    Some(lower)
                } else {
                    None
                }
            }
            PositionState::Flat => None,
        }
    }

    fn entry(&self, bars: &[OhlcvBar], i: usize) -> Option<(PositionState, f64)> {
        let bar = &bars[i];
        let upper = self.bands.upper_at(i)?;
        let lower = self.bands.lower_at(i)?;
        let trend = self.trend.get(i);

        if above(Some(bar.close), trend) && bar.low <= lower {
            Some((PositionState::Long, lower))
        } else if below(Some(bar.close), trend) && bar.high >= upper {
            Some((PositionState::Short, upper))
        } else {
            None
        }
    }

    fn reenters_on_exit_bar(&self) -> bool {
        true
    }
}
