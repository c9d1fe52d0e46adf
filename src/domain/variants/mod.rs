//! Entry/exit predicates for each strategy variant.
//!
//! The backtest engine owns the bar loop and the position state; a variant only
//! answers two questions per bar through [`BarRules`]: does the open position
//! close here (and at what price), and does a new position open here.
//! Variants that fill at the open never open on a bar whose close just ended a
//! trade.

pub mod breakout;
pub mod dual_ma;
pub mod trend_reversion;
pub mod triple_ma;

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::position::{PositionState, SimState};
use crate::domain::strategy::Strategy;

pub trait BarRules {
    /// First bar index the engine visits.
    fn first_bar(&self) -> usize;

    /// Exit price when the open position in `state` closes on bar `i`.
    fn exit_price(&self, bars: &[OhlcvBar], i: usize, state: &SimState) -> Option<f64>;

    /// Side and fill price when a position opens on bar `i`.
    fn entry(&self, bars: &[OhlcvBar], i: usize) -> Option<(PositionState, f64)>;

    /// Whether a position may open on the bar where the previous one closed.
    /// Variants that fill at the open must already be flat at that open.
    fn reenters_on_exit_bar(&self) -> bool {
        false
    }
}

/// Precompute the variant's indicators over `bars`.
pub fn build_rules(strategy: &Strategy, bars: &[OhlcvBar]) -> Box<dyn BarRules> {
    match strategy {
        Strategy::Breakout(p) => Box::new(breakout::BreakoutRules::new(bars, p)),
        Strategy::DualMa(p) => Box::new(dual_ma::DualMaRules::new(bars, p)),
        Strategy::TripleMa(p) => Box::new(triple_ma::TripleMaRules::new(bars, p)),
        Strategy::TrendReversion(p) => {
            Box::new(trend_reversion::TrendReversionRules::new(bars, p))
        }
    }
}
