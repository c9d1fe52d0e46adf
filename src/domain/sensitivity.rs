//! Sensitivity sweep: repeated backtests over randomly sampled parameters.
//!
//! Parameters are drawn uniformly and independently from inclusive ranges
//! (integers for windows, continuous otherwise). A draw that violates the
//! variant's window ordering is discarded and the whole set redrawn, up to a
//! fixed attempt ceiling. Sampling always runs on the caller's generator in
//! order; only the backtests themselves may fan out across a rayon pool, and
//! rows are collected in sample order either way.

use std::cmp::Ordering;

use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, info};

use super::backtest::{run_backtest_with, BacktestConfig, BacktestResult};
use super::error::SweepError;
use super::metrics::{Metrics, COLUMNS};
use super::ohlcv::OhlcvBar;
use super::strategy::{describe, ParamSpec, ParameterSet, Strategy, StrategyKind};

/// Draws allowed per sample before the ranges are declared unsatisfiable.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10_000;

/// Inclusive bounds for one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
}

impl ParamRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn integer_bounds(&self) -> (i64, i64) {
        (self.min.ceil() as i64, self.max.floor() as i64)
    }

    fn check(&self, spec: &ParamSpec) -> Result<(), SweepError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(SweepError::configuration(format!(
                "range for {} must be finite, got ({}, {})",
                spec.name, self.min, self.max
            )));
        }
        if self.min > self.max {
            return Err(SweepError::configuration(format!(
                "range for {} is inverted: min {} > max {}",
                spec.name, self.min, self.max
            )));
        }
        if spec.is_integer() {
            let (lo, hi) = self.integer_bounds();
            if lo > hi {
                return Err(SweepError::configuration(format!(
                    "range for {} contains no integer: ({}, {})",
                    spec.name, self.min, self.max
                )));
            }
            spec.check(lo as f64)?;
            spec.check(hi as f64)
        } else {
            spec.check(self.min)?;
            spec.check(self.max)
        }
    }

    fn sample<R: Rng>(&self, spec: &ParamSpec, rng: &mut R) -> f64 {
        if spec.is_integer() {
            let (lo, hi) = self.integer_bounds();
            rng.gen_range(lo..=hi) as f64
        } else if self.min == self.max {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }
}

/// Named parameter ranges in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamRanges {
    entries: Vec<(String, ParamRange)>,
}

impl ParamRanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, min: f64, max: f64) -> Self {
        self.insert(name, ParamRange::new(min, max));
        self
    }

    pub fn insert(&mut self, name: &str, range: ParamRange) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, r)) => *r = range,
            None => self.entries.push((name.to_string(), range)),
        }
    }

    pub fn get(&self, name: &str) -> Option<ParamRange> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| *r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ParamRange)> {
        self.entries.iter().map(|(n, r)| (n.as_str(), *r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ranges used when the configuration supplies none.
    pub fn default_for(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Breakout => Self::new()
                .with("bb_period", 16.0, 40.0)
                .with("bb_std", 1.0, 3.0)
                .with("drop_threshold", 0.1, 0.9),
            StrategyKind::DualMa => Self::new()
                .with("short_ma_period", 3.0, 10.0)
                .with("long_ma_period", 15.0, 30.0),
            StrategyKind::TripleMa => Self::new()
                .with("ma_short", 3.0, 8.0)
                .with("ma_medium", 9.0, 15.0)
                .with("ma_long", 16.0, 30.0),
            StrategyKind::TrendReversion => Self::new()
                .with("bb_period", 5.0, 20.0)
                .with("bb_std", 1.0, 3.0)
                .with("ma_long_period", 10.0, 60.0),
        }
    }
}

/// One accepted sample with the scorecard of its run.
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityRow {
    pub params: ParameterSet,
    pub metrics: Metrics,
}

impl SensitivityRow {
    /// Parameter value or scorecard field by column name.
    pub fn value(&self, column: &str) -> Option<f64> {
        self.params.get(column).or_else(|| self.metrics.column(column))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TercileSummary {
    pub label: &'static str,
    pub count: usize,
    /// Median of each sampled parameter within the tercile.
    pub medians: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityTable {
    pub strategy: StrategyKind,
    pub param_names: Vec<String>,
    pub rows: Vec<SensitivityRow>,
}

impl SensitivityTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Parameter columns followed by the scorecard columns.
    pub fn columns(&self) -> Vec<String> {
        self.param_names
            .iter()
            .cloned()
            .chain(COLUMNS.iter().map(|c| c.to_string()))
            .collect()
    }

    fn has_column(&self, name: &str) -> bool {
        self.param_names.iter().any(|p| p == name) || COLUMNS.contains(&name)
    }

    fn require_column(&self, name: &str) -> Result<(), SweepError> {
        if self.has_column(name) {
            Ok(())
        } else {
            Err(SweepError::configuration(format!(
                "unknown sensitivity column {}",
                name
            )))
        }
    }

    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        if !self.has_column(name) {
            return None;
        }
        Some(
            self.rows
                .iter()
                .map(|r| r.value(name).unwrap_or(f64::NAN))
                .collect(),
        )
    }

    /// Stable sort on one column. NaN compares greater than every number.
    pub fn sort_by(&mut self, column: &str, descending: bool) -> Result<(), SweepError> {
        self.require_column(column)?;
        self.rows.sort_by(|a, b| {
            let ord = compare(a.value(column), b.value(column));
            if descending { ord.reverse() } else { ord }
        });
        Ok(())
    }

    /// Split rows into low/mid/high terciles by rank on `column` and report
    /// the median of each parameter per tercile. Empty terciles are omitted.
    pub fn tercile_medians(&self, column: &str) -> Result<Vec<TercileSummary>, SweepError> {
        self.require_column(column)?;

        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        order.sort_by(|&a, &b| compare(self.rows[a].value(column), self.rows[b].value(column)));

        let n = order.len();
        let mut groups: [Vec<usize>; 3] = Default::default();
        for (rank, &row) in order.iter().enumerate() {
            groups[rank * 3 / n].push(row);
        }

        let summaries = ["low", "mid", "high"]
            .into_iter()
            .zip(groups)
            .filter(|(_, members)| !members.is_empty())
            .map(|(label, members)| {
                let medians = self
                    .param_names
                    .iter()
                    .map(|p| {
                        let values: Vec<f64> = members
                            .iter()
                            .filter_map(|&i| self.rows[i].params.get(p))
                            .collect();
                        (p.clone(), median(values))
                    })
                    .collect();
                TercileSummary {
                    label,
                    count: members.len(),
                    medians,
                }
            })
            .collect();

        Ok(summaries)
    }
}

fn compare(a: Option<f64>, b: Option<f64>) -> Ordering {
    let a = a.filter(|v| !v.is_nan());
    let b = b.filter(|v| !v.is_nan());
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Drives a sensitivity sweep for one strategy variant.
#[derive(Debug, Clone)]
pub struct SensitivityDriver {
    kind: StrategyKind,
    ranges: ParamRanges,
    fixed: ParameterSet,
    max_attempts: usize,
    parallel: bool,
    backtest_config: BacktestConfig,
}

impl SensitivityDriver {
    /// Checks that every parameter of `kind` has a usable range and that no
    /// range names an unknown parameter.
    pub fn new(kind: StrategyKind, ranges: ParamRanges) -> Result<Self, SweepError> {
        for (name, _) in ranges.iter() {
            if kind.param_spec(name).is_none() {
                return Err(SweepError::configuration(format!(
                    "{} has no sampled parameter named {}",
                    kind, name
                )));
            }
        }
        for spec in kind.param_specs() {
            let range = ranges.get(spec.name).ok_or_else(|| {
                SweepError::configuration(format!("missing range for {} parameter {}", kind, spec.name))
            })?;
            range.check(spec)?;
        }

        Ok(Self {
            kind,
            ranges,
            fixed: ParameterSet::new(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            parallel: false,
            backtest_config: BacktestConfig::default(),
        })
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Non-sampled parameters passed to every run, e.g. `bias_threshold`.
    pub fn with_fixed_params(mut self, fixed: ParameterSet) -> Self {
        self.fixed = fixed;
        self
    }

    pub fn with_backtest_config(mut self, config: BacktestConfig) -> Self {
        self.backtest_config = config;
        self
    }

    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    pub fn ranges(&self) -> &ParamRanges {
        &self.ranges
    }

    /// Draw one parameter set that satisfies the window ordering.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Result<Strategy, SweepError> {
        for attempt in 1..=self.max_attempts {
            let mut params = self.fixed.clone();
            for spec in self.kind.param_specs() {
                let range = self.ranges.get(spec.name).ok_or_else(|| {
                    SweepError::configuration(format!("missing range for {}", spec.name))
                })?;
                params.insert(spec.name, range.sample(spec, rng));
            }

            let strategy = Strategy::assemble(self.kind, &params)?;
            if strategy.satisfies_ordering() {
                if attempt > 1 {
                    debug!(rejected = attempt - 1, "sample accepted after rejections");
                }
                return Ok(strategy);
            }
        }

        Err(SweepError::configuration(format!(
            "no {} parameters satisfying the window ordering found in {} attempts; ranges: {}",
            self.kind,
            self.max_attempts,
            self.describe_ranges()
        )))
    }

    fn describe_ranges(&self) -> String {
        self.ranges
            .iter()
            .map(|(n, r)| format!("{}=({}, {})", n, r.min, r.max))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn run<R: Rng>(
        &self,
        bars: &[OhlcvBar],
        iterations: usize,
        rng: &mut R,
    ) -> Result<SensitivityTable, SweepError> {
        let config = self.backtest_config.clone();
        self.run_with(
            bars,
            iterations,
            rng,
            move |data, strategy| run_backtest_with(data, strategy, &config),
            Metrics::compute,
        )
    }

    /// Sweep with caller-supplied engine and evaluator functions.
    pub fn run_with<R, B, E>(
        &self,
        bars: &[OhlcvBar],
        iterations: usize,
        rng: &mut R,
        backtest: B,
        evaluate: E,
    ) -> Result<SensitivityTable, SweepError>
    where
        R: Rng,
        B: Fn(&[OhlcvBar], &Strategy) -> Result<BacktestResult, SweepError> + Sync,
        E: Fn(&BacktestResult) -> Metrics + Sync,
    {
        info!(
            strategy = %self.kind,
            iterations,
            parallel = self.parallel,
            "starting sensitivity sweep"
        );

        let samples = (0..iterations)
            .map(|_| self.sample(rng))
            .collect::<Result<Vec<_>, _>>()?;

        let run_one = |strategy: &Strategy| -> Result<SensitivityRow, SweepError> {
            let result = backtest(bars, strategy)?;
            let metrics = evaluate(&result);
            debug!(
                params = %describe(&strategy.to_params()),
                final_equity = metrics.final_equity,
                trades = metrics.total_trades,
                "sample evaluated"
            );
            Ok(SensitivityRow {
                params: strategy.to_params(),
                metrics,
            })
        };

        let rows = if self.parallel {
            samples.par_iter().map(run_one).collect::<Result<Vec<_>, _>>()?
        } else {
            samples.iter().map(run_one).collect::<Result<Vec<_>, _>>()?
        };

        info!(strategy = %self.kind, rows = rows.len(), "sensitivity sweep complete");

        Ok(SensitivityTable {
            strategy: self.kind,
            param_names: self
                .kind
                .param_specs()
                .iter()
                .map(|s| s.name.to_string())
                .collect(),
            rows,
        })
    }
}
