//! Report export port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SweepError;
use crate::domain::sensitivity::SensitivityTable;

/// Port for exporting simulation output. Implementations only read.
pub trait ReportPort {
    /// One row per bar: prices plus position, realized return, equity and
    /// the buy-and-hold benchmark.
    fn write_run(&self, result: &BacktestResult, output_path: &str) -> Result<(), SweepError>;

    /// One row per sample: parameter columns then scorecard columns.
    fn write_table(&self, table: &SensitivityTable, output_path: &str) -> Result<(), SweepError>;
}
