//! Performance scorecard for one simulated run.

use super::backtest::BacktestResult;

/// Scorecard column names, in export order.
pub const COLUMNS: [&str; 16] = [
    "final_equity",
    "net_profit",
    "max_drawdown",
    "total_trades",
    "winning_trades",
    "losing_trades",
    "win_rate",
    "gross_profit",
    "gross_loss",
    "avg_win",
    "avg_loss",
    "profit_factor",
    "largest_win",
    "largest_loss",
    "longest_win_streak",
    "longest_loss_streak",
];

/// Losses (`gross_loss`, `avg_loss`, `largest_loss`) keep their negative sign.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metrics {
    pub final_equity: f64,
    pub net_profit: f64,
    pub max_drawdown: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Fraction in [0, 1].
    pub win_rate: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub longest_win_streak: usize,
    pub longest_loss_streak: usize,
}

impl Metrics {
    pub fn compute(result: &BacktestResult) -> Self {
        Self::from_series(&result.returns, &result.equity)
    }

    /// Build the scorecard from a realized-return series and an equity curve.
    ///
    /// Trades are the nonzero entries of `returns`. With no trades every field
    /// is zero except `final_equity`.
    pub fn from_series(returns: &[f64], equity: &[f64]) -> Self {
        let final_equity = equity.last().copied().unwrap_or(0.0);
        let trades: Vec<f64> = returns.iter().copied().filter(|r| *r != 0.0).collect();

        if trades.is_empty() {
            return Self {
                final_equity,
                ..Self::default()
            };
        }

        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        for &ret in &trades {
            if ret > 0.0 {
                winning_trades += 1;
                gross_profit += ret;
                largest_win = largest_win.max(ret);
            } else {
                losing_trades += 1;
                gross_loss += ret;
                largest_loss = largest_loss.min(ret);
            }
        }

        let total_trades = trades.len();
        let avg_win = if winning_trades > 0 {
            gross_profit / winning_trades as f64
        } else {
            0.0
        };
        let avg_loss = if losing_trades > 0 {
            gross_loss / losing_trades as f64
        } else {
            0.0
        };
        let profit_factor = if losing_trades == 0 {
            f64::INFINITY
        } else {
            (avg_win / avg_loss).abs()
        };
        let (longest_win_streak, longest_loss_streak) = compute_streaks(&trades);

        Self {
            final_equity,
            net_profit: gross_profit + gross_loss,
            max_drawdown: compute_drawdown(equity),
            total_trades,
            winning_trades,
            losing_trades,
            win_rate: winning_trades as f64 / total_trades as f64,
            gross_profit,
            gross_loss,
            avg_win,
            avg_loss,
            profit_factor,
            largest_win,
            largest_loss,
            longest_win_streak,
            longest_loss_streak,
        }
    }

    /// Win rate as a percentage with two decimals, e.g. `"62.50%"`.
    pub fn win_rate_display(&self) -> String {
        format!("{:.2}%", self.win_rate * 100.0)
    }

    /// Look up a scorecard field by its column name.
    pub fn column(&self, name: &str) -> Option<f64> {
        let value = match name {
            "final_equity" => self.final_equity,
            "net_profit" => self.net_profit,
            "max_drawdown" => self.max_drawdown,
            "total_trades" => self.total_trades as f64,
            "winning_trades" => self.winning_trades as f64,
            "losing_trades" => self.losing_trades as f64,
            "win_rate" => self.win_rate,
            "gross_profit" => self.gross_profit,
            "gross_loss" => self.gross_loss,
            "avg_win" => self.avg_win,
            "avg_loss" => self.avg_loss,
            "profit_factor" => self.profit_factor,
            "largest_win" => self.largest_win,
            "largest_loss" => self.largest_loss,
            "longest_win_streak" => self.longest_win_streak as f64,
            "longest_loss_streak" => self.longest_loss_streak as f64,
            _ => return None,
        };
        Some(value)
    }

    pub fn values(&self) -> Vec<f64> {
        COLUMNS.iter().filter_map(|c| self.column(c)).collect()
    }
}

/// Largest drop from the running peak. Never negative.
pub fn compute_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &e in equity {
        peak = peak.max(e);
        max_dd = max_dd.max(peak - e);
    }
    max_dd
}

fn compute_streaks(trades: &[f64]) -> (usize, usize) {
    let (mut win, mut loss) = (0usize, 0usize);
    let (mut best_win, mut best_loss) = (0usize, 0usize);
    for &ret in trades {
        if ret > 0.0 {
            win += 1;
            loss = 0;
            best_win = best_win.max(win);
        } else {
            loss += 1;
            win = 0;
            best_loss = best_loss.max(loss);
        }
    }
    (best_win, best_loss)
}
