//! Triple moving-average alignment.
//!
//! Entry: MA_short > MA_medium > MA_long on bar i-1; enter long at open[i].
//! Exit: MA_short < MA_medium on bar i, filled at the close.

use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{above, below, IndicatorSeries};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::position::{PositionState, SimState};
use crate::domain::strategy::TripleMaParams;

use super::BarRules;

pub struct TripleMaRules {
    short: IndicatorSeries,
    medium: IndicatorSeries,
    long: IndicatorSeries,
}

impl TripleMaRules {
    pub fn new(bars: &[OhlcvBar], params: &TripleMaParams) -> Self {
        Self {
            short: calculate_sma(bars, params.ma_short),
            medium: calculate_sma(bars, params.ma_medium),
            long: calculate_sma(bars, params.ma_long),
        }
    }

    fn aligned(&self, i: usize) -> bool {
        above(self.short.get(i), self.medium.get(i)) && above(self.medium.get(i), self.long.get(i))
    }
}

impl BarRules for TripleMaRules {
    fn first_bar(&self) -> usize {
        1
    }

    fn exit_price(&self, bars: &[OhlcvBar], i: usize, state: &SimState) -> Option<f64> {
        (state.position == PositionState::Long && below(self.short.get(i), self.medium.get(i)))
            .then_some(bars[i].close)
    }

    fn entry(&self, bars: &[OhlcvBar], i: usize) -> Option<(PositionState, f64)> {
        (i > 0 && self.aligned(i - 1)).then(|| (PositionState::Long, bars[i].open))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::variants::test_support::bars_close;

    fn params() -> TripleMaParams {
        TripleMaParams {
            ma_short: 1,
            ma_medium: 2,
            ma_long: 3,
        }
    }

    #[test]
    fn rising_prices_align_and_enter_next_bar() {
        let bars = bars_close(&[1.0, 2.0, 3.0, 4.0]);
        let rules = TripleMaRules::new(&bars, &params());

        // alignment needs MA3, first defined on bar 2
        assert!(!rules.aligned(1));
        assert!(rules.aligned(2));
        assert!(rules.entry(&bars, 2).is_none());
        assert_eq!(rules.entry(&bars, 3), Some((PositionState::Long, 4.0)));
    }

    #[test]
    fn exit_when_short_below_medium() {
        let bars = bars_close(&[1.0, 2.0, 3.0, 4.0, 2.0]);
        let rules = TripleMaRules::new(&bars, &params());
        let state = SimState::new().open(PositionState::Long, 4.0, 3);

        // bar 4: MA1 = 2 < MA2 = 3
        assert_eq!(rules.exit_price(&bars, 4, &state), Some(2.0));
        assert!(rules.exit_price(&bars, 3, &state).is_none());
    }

    #[test]
    fn falling_prices_never_align() {
        let bars = bars_close(&[5.0, 4.0, 3.0, 2.0, 1.0]);
        let rules = TripleMaRules::new(&bars, &params());
        assert!((0..5).all(|i| rules.entry(&bars, i).is_none()));
    }
}
