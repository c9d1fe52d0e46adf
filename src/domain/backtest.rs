//! Backtest engine: the per-bar strategy simulation loop.
//!
//! For each bar from the variant's first index:
//! 1. exit check when holding a position
//! 2. entry check when flat after step 1; on an exit bar only for variants
//!    that allow re-entry there (`BarRules::reenters_on_exit_bar`)
//! 3. equity = realized total + mark-to-market of the open position at the close
//! 4. record the position
//!
//! A position still open on the last bar stays open unless
//! [`EndOfData::Liquidate`] is configured.

use tracing::{debug, warn};

use super::error::SweepError;
use super::ohlcv::{validate_bars, OhlcvBar};
use super::position::{PositionState, SimState, TradeRecord};
use super::strategy::Strategy;
use super::variants::build_rules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndOfData {
    /// Leave the final position open; it shows up only in the equity curve.
    #[default]
    HoldOpen,
    /// Close any open position at the last bar's close.
    Liquidate,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BacktestConfig {
    pub end_of_data: EndOfData,
}

/// One simulated run.
///
/// The per-bar vectors are aligned with `bars`. When the dataset is shorter
/// than the strategy's lookback the run is a pass-through: `bars` is returned
/// as given and every derived vector is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub strategy: Strategy,
    pub bars: Vec<OhlcvBar>,
    pub positions: Vec<PositionState>,
    /// Realized return on exit bars, zero elsewhere.
    pub returns: Vec<f64>,
    /// Mark-to-market equity.
    pub equity: Vec<f64>,
    /// Buy-and-hold benchmark: close[i] - close[0].
    pub buy_and_hold: Vec<f64>,
    pub trades: Vec<TradeRecord>,
}

impl BacktestResult {
    fn passthrough(strategy: &Strategy, bars: Vec<OhlcvBar>) -> Self {
        Self {
            strategy: strategy.clone(),
            bars,
            positions: Vec::new(),
            returns: Vec::new(),
            equity: Vec::new(),
            buy_and_hold: Vec::new(),
            trades: Vec::new(),
        }
    }

    pub fn is_simulated(&self) -> bool {
        !self.equity.is_empty()
    }

    pub fn final_equity(&self) -> f64 {
        self.equity.last().copied().unwrap_or(0.0)
    }
}

pub fn run_backtest(bars: &[OhlcvBar], strategy: &Strategy) -> Result<BacktestResult, SweepError> {
    run_backtest_with(bars, strategy, &BacktestConfig::default())
}

pub fn run_backtest_with(
    bars: &[OhlcvBar],
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Result<BacktestResult, SweepError> {
    validate_bars(bars)?;
    strategy.validate()?;

    let bars = bars.to_vec();
    let lookback = strategy.lookback();
    if bars.len() < lookback {
        warn!(
            strategy = %strategy.kind(),
            bars = bars.len(),
            lookback,
            "fewer bars than the lookback, returning data unchanged"
        );
        return Ok(BacktestResult::passthrough(strategy, bars));
    }

    let rules = build_rules(strategy, &bars);
    let n = bars.len();
    let mut positions = vec![PositionState::Flat; n];
    let mut returns = vec![0.0; n];
    let mut equity = vec![0.0; n];
    let mut trades = Vec::new();
    let mut state = SimState::new();

    for i in rules.first_bar()..n {
        let mut exited = false;
        if !state.position.is_flat() {
            if let Some(price) = rules.exit_price(&bars, i, &state) {
                let (next, trade) = state.close(price, i);
                state = next;
                if let Some(trade) = trade {
                    returns[i] = trade.realized_return;
                    trades.push(trade);
                    exited = true;
                }
            }
        }

        if state.position.is_flat() && (!exited || rules.reenters_on_exit_bar()) {
            if let Some((side, price)) = rules.entry(&bars, i) {
                state = state.open(side, price, i);
            }
        }

        equity[i] = state.equity(bars[i].close);
        positions[i] = state.position;
    }

    if config.end_of_data == EndOfData::Liquidate && !state.position.is_flat() {
        let last = n - 1;
        let (next, trade) = state.close(bars[last].close, last);
        if let Some(trade) = trade {
            returns[last] = trade.realized_return;
            trades.push(trade);
            positions[last] = next.position;
            equity[last] = next.realized_total;
        }
    }

    let first_close = bars[0].close;
    let buy_and_hold = bars.iter().map(|b| b.close - first_close).collect();

    debug!(
        strategy = %strategy.kind(),
        bars = n,
        trades = trades.len(),
        final_equity = equity[n - 1],
        "backtest complete"
    );

    Ok(BacktestResult {
        strategy: strategy.clone(),
        bars,
        positions,
        returns,
        equity,
        buy_and_hold,
        trades,
    })
}
