//! CSV report writer for single runs and sensitivity tables.

use std::io::Write;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SweepError;
use crate::domain::indicator::rsi::{calculate_rsi, DEFAULT_RSI_PERIOD};
use crate::domain::indicator::signal::rsi_signal;
use crate::domain::sensitivity::SensitivityTable;
use crate::ports::report_port::ReportPort;

const RUN_HEADER: [&str; 11] = [
    "date",
    "open",
    "high",
    "low",
    "close",
    "position",
    "ret",
    "equity",
    "BH",
    "rsi",
    "rsi_signal",
];

#[derive(Debug)]
pub struct CsvReportAdapter {
    rsi_period: usize,
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self {
            rsi_period: DEFAULT_RSI_PERIOD,
        }
    }

    pub fn with_rsi_period(mut self, period: usize) -> Self {
        self.rsi_period = period;
        self
    }

    /// Write a single run with RSI columns alongside. A pass-through run (too
    /// few bars) leaves the derived columns empty; undefined RSI is an empty
    /// cell.
    pub fn write_run_to<W: Write>(
        &self,
        result: &BacktestResult,
        out: W,
    ) -> Result<(), SweepError> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(RUN_HEADER)?;

        let rsi = calculate_rsi(&result.bars, self.rsi_period);
        let signal = rsi_signal(&rsi);

        for (i, bar) in result.bars.iter().enumerate() {
            let derived = if result.is_simulated() {
                [
                    result.positions[i].as_i8().to_string(),
                    result.returns[i].to_string(),
                    result.equity[i].to_string(),
                    result.buy_and_hold[i].to_string(),
                    rsi.get(i).map(|v| v.to_string()).unwrap_or_default(),
                    signal[i].to_string(),
                ]
            } else {
                Default::default()
            };

            let mut record = vec![
                bar.date.format("%Y-%m-%d").to_string(),
                bar.open.to_string(),
                bar.high.to_string(),
                bar.low.to_string(),
                bar.close.to_string(),
            ];
            record.extend(derived);
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }

    pub fn write_table_to<W: Write>(table: &SensitivityTable, out: W) -> Result<(), SweepError> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(table.columns())?;

        for row in &table.rows {
            let record: Vec<String> = table
                .param_names
                .iter()
                .map(|p| row.params.get(p).map(|v| v.to_string()).unwrap_or_default())
                .chain(row.metrics.values().iter().map(|v| v.to_string()))
                .collect();
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_run(&self, result: &BacktestResult, output_path: &str) -> Result<(), SweepError> {
        let file = std::fs::File::create(output_path)?;
        self.write_run_to(result, file)
    }

    fn write_table(&self, table: &SensitivityTable, output_path: &str) -> Result<(), SweepError> {
        let file = std::fs::File::create(output_path)?;
        Self::write_table_to(table, file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::run_backtest;
    use crate::domain::metrics::{Metrics, COLUMNS};
    use crate::domain::sensitivity::SensitivityRow;
    use crate::domain::strategy::{DualMaParams, ParameterSet, Strategy, StrategyKind};
    use crate::domain::variants::test_support::bars_close;

    fn strategy() -> Strategy {
        Strategy::DualMa(DualMaParams {
            short_ma_period: 2,
            long_ma_period: 3,
            bias_threshold: None,
        })
    }

    #[test]
    fn run_export_has_one_row_per_bar() {
        let result = run_backtest(&bars_close(&[10.0, 11.0, 9.0, 12.0]), &strategy()).unwrap();
        let mut buf = Vec::new();
        CsvReportAdapter::new()
            .write_run_to(&result, &mut buf)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "date,open,high,low,close,position,ret,equity,BH,rsi,rsi_signal"
        );
        assert_eq!(lines.len(), 5);
        // RSI(14) is undefined over four bars
        assert_eq!(lines[1], "2024-01-01,10,10,10,10,0,0,0,0,,0");
        assert!(lines[4].ends_with(",2,,0"));
    }

    #[test]
    fn run_export_carries_rsi_and_signal() {
        // RSI(2) on 10, 11, 9, 12: bar 2 = 100 * 0.5 / 1.5, bar 3 = 100 * 1.5 / 2.5
        let result = run_backtest(&bars_close(&[10.0, 11.0, 9.0, 12.0]), &strategy()).unwrap();
        let mut buf = Vec::new();
        CsvReportAdapter::new()
            .with_rsi_period(2)
            .write_run_to(&result, &mut buf)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        let rows: Vec<Vec<&str>> = text.lines().skip(1).map(|l| l.split(',').collect()).collect();

        assert_eq!(rows[1][9], "");
        let rsi2: f64 = rows[2][9].parse().unwrap();
        let rsi3: f64 = rows[3][9].parse().unwrap();
        assert!((rsi2 - 100.0 / 3.0).abs() < 1e-6);
        assert!((rsi3 - 60.0).abs() < 1e-6);
        assert!(rows.iter().all(|r| r[10] == "0"));

        // a steady climb saturates near 100 and flags overbought
        let result = run_backtest(&bars_close(&[10.0, 11.0, 12.0, 13.0]), &strategy()).unwrap();
        let mut buf = Vec::new();
        CsvReportAdapter::new()
            .with_rsi_period(2)
            .write_run_to(&result, &mut buf)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.lines().last().unwrap().ends_with(",-1"));
    }

    #[test]
    fn passthrough_run_leaves_derived_columns_empty() {
        let result = run_backtest(&bars_close(&[10.0, 11.0]), &strategy()).unwrap();
        let mut buf = Vec::new();
        CsvReportAdapter::new()
            .write_run_to(&result, &mut buf)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().nth(1), Some("2024-01-01,10,10,10,10,,,,,,"));
    }

    #[test]
    fn table_export_columns() {
        let table = SensitivityTable {
            strategy: StrategyKind::DualMa,
            param_names: vec!["short_ma_period".into(), "long_ma_period".into()],
            rows: vec![SensitivityRow {
                params: ParameterSet::new()
                    .with("short_ma_period", 4.0)
                    .with("long_ma_period", 20.0),
                metrics: Metrics {
                    final_equity: 12.5,
                    ..Metrics::default()
                },
            }],
        };
        let mut buf = Vec::new();
        CsvReportAdapter::write_table_to(&table, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("short_ma_period,long_ma_period,final_equity,net_profit"));
        assert_eq!(header.split(',').count(), 2 + COLUMNS.len());
        assert!(lines.next().unwrap().starts_with("4,20,12.5,0"));
    }

    #[test]
    fn write_run_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("run.csv");
        let result = run_backtest(&bars_close(&[10.0, 11.0, 9.0]), &strategy()).unwrap();

        CsvReportAdapter::new()
            .write_run(&result, path.to_str().unwrap())
            .unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().count(), 4);
    }
}
