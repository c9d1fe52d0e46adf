//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{run_backtest_with, BacktestResult};
use crate::domain::config_validation::{
    backtest_config, data_path, sensitivity_driver, strategy_from_config, sweep_settings,
    validate_config,
};
use crate::domain::error::SweepError;
use crate::domain::metrics::Metrics;
use crate::domain::sensitivity::SensitivityTable;
use crate::domain::strategy::describe;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

/// Rows printed from a sensitivity table.
const TOP_ROWS: usize = 5;

#[derive(Parser, Debug)]
#[command(name = "bandsweep", about = "Rule-based strategy backtester and parameter sweeper")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one backtest with the configured strategy parameters
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Bar CSV, overriding [data] path
        #[arg(long)]
        data: Option<PathBuf>,
        /// Write the per-bar run to this CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a randomized parameter sensitivity sweep
    Sensitivity {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long)]
        iterations: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        /// Scorecard column to rank the printed rows by
        #[arg(long, default_value = "final_equity")]
        sort_by: String,
        /// Write the full table to this CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            data,
            output,
        } => run_single(&config, data.as_ref(), output.as_ref()),
        Command::Sensitivity {
            config,
            data,
            iterations,
            seed,
            sort_by,
            output,
        } => run_sensitivity(
            &config,
            data.as_ref(),
            iterations,
            seed,
            &sort_by,
            output.as_ref(),
        ),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, SweepError> {
    FileConfigAdapter::from_file(path).map_err(|e| SweepError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn resolve_data_path(
    data_override: Option<&PathBuf>,
    config: &dyn ConfigPort,
) -> Result<String, SweepError> {
    match data_override {
        Some(p) => Ok(p.display().to_string()),
        None => data_path(config),
    }
}

fn run_single(
    config_path: &PathBuf,
    data_override: Option<&PathBuf>,
    output_path: Option<&PathBuf>,
) -> Result<(), SweepError> {
    info!(config = %config_path.display(), "loading config");
    let adapter = load_config(config_path)?;

    let strategy = strategy_from_config(&adapter)?;
    let bt_config = backtest_config(&adapter)?;
    let bars = CsvAdapter::new().load_bars(&resolve_data_path(data_override, &adapter)?)?;

    let result = run_backtest_with(&bars, &strategy, &bt_config)?;
    print_run(&result);

    if let Some(path) = output_path {
        CsvReportAdapter::new().write_run(&result, &path.display().to_string())?;
        info!(path = %path.display(), "run written");
    }
    Ok(())
}

fn print_run(result: &BacktestResult) {
    println!(
        "Strategy: {} ({})",
        result.strategy.kind(),
        describe(&result.strategy.to_params())
    );
    if !result.is_simulated() {
        println!(
            "Only {} bars, fewer than the lookback of {}: nothing simulated.",
            result.bars.len(),
            result.strategy.lookback()
        );
    }
    print_metrics(&Metrics::compute(result));
    if let Some(last) = result.buy_and_hold.last() {
        println!("{:<22}{:.4}", "buy_and_hold", last);
    }
}

fn print_metrics(m: &Metrics) {
    println!("{:<22}{:.4}", "final_equity", m.final_equity);
    println!("{:<22}{:.4}", "net_profit", m.net_profit);
    println!("{:<22}{:.4}", "max_drawdown", m.max_drawdown);
    println!("{:<22}{}", "total_trades", m.total_trades);
    println!("{:<22}{}", "winning_trades", m.winning_trades);
    println!("{:<22}{}", "losing_trades", m.losing_trades);
    println!("{:<22}{}", "win_rate", m.win_rate_display());
    println!("{:<22}{:.4}", "gross_profit", m.gross_profit);
    println!("{:<22}{:.4}", "gross_loss", m.gross_loss);
    println!("{:<22}{:.4}", "avg_win", m.avg_win);
    println!("{:<22}{:.4}", "avg_loss", m.avg_loss);
    println!("{:<22}{:.4}", "profit_factor", m.profit_factor);
    println!("{:<22}{:.4}", "largest_win", m.largest_win);
    println!("{:<22}{:.4}", "largest_loss", m.largest_loss);
    println!("{:<22}{}", "longest_win_streak", m.longest_win_streak);
    println!("{:<22}{}", "longest_loss_streak", m.longest_loss_streak);
}

fn run_sensitivity(
    config_path: &PathBuf,
    data_override: Option<&PathBuf>,
    iterations: Option<usize>,
    seed: Option<u64>,
    sort_by: &str,
    output_path: Option<&PathBuf>,
) -> Result<(), SweepError> {
    info!(config = %config_path.display(), "loading config");
    let adapter = load_config(config_path)?;

    let settings = sweep_settings(&adapter)?;
    let iterations = iterations.unwrap_or(settings.iterations);
    let seed = seed.unwrap_or(settings.seed);
    let driver = sensitivity_driver(&adapter)?;
    let bars = CsvAdapter::new().load_bars(&resolve_data_path(data_override, &adapter)?)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let table = driver.run(&bars, iterations, &mut rng)?;

    if let Some(path) = output_path {
        CsvReportAdapter::new().write_table(&table, &path.display().to_string())?;
        info!(path = %path.display(), rows = table.len(), "table written");
    }

    print_table(table, sort_by)
}

fn print_table(mut table: SensitivityTable, sort_by: &str) -> Result<(), SweepError> {
    table.sort_by(sort_by, true)?;

    println!("Top {} of {} samples by {}:", TOP_ROWS.min(table.len()), table.len(), sort_by);
    for row in table.rows.iter().take(TOP_ROWS) {
        println!(
            "  {}  {}={:.4}  trades={}  win_rate={}",
            describe(&row.params),
            sort_by,
            row.value(sort_by).unwrap_or(f64::NAN),
            row.metrics.total_trades,
            row.metrics.win_rate_display()
        );
    }

    println!("\nParameter medians by {} tercile:", sort_by);
    for tercile in table.tercile_medians(sort_by)? {
        let medians = tercile
            .medians
            .iter()
            .map(|(name, value)| format!("{}={:.2}", name, value))
            .collect::<Vec<_>>()
            .join(", ");
        println!("  {:<5} (n={:>3})  {}", tercile.label, tercile.count, medians);
    }
    Ok(())
}

fn run_validate(config_path: &PathBuf) -> Result<(), SweepError> {
    info!(config = %config_path.display(), "validating config");
    let adapter = load_config(config_path)?;
    validate_config(&adapter)?;

    let strategy = strategy_from_config(&adapter)?;
    let driver = sensitivity_driver(&adapter)?;
    println!("Strategy: {} ({})", strategy.kind(), describe(&strategy.to_params()));
    for (name, range) in driver.ranges().iter() {
        println!("  range {} = {}, {}", name, range.min, range.max);
    }
    println!("Configuration is valid.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sensitivity_overrides() {
        let cli = Cli::try_parse_from([
            "bandsweep",
            "sensitivity",
            "-c",
            "sweep.ini",
            "--iterations",
            "25",
            "--seed",
            "9",
        ])
        .unwrap();
        match cli.command {
            Command::Sensitivity {
                iterations,
                seed,
                sort_by,
                ..
            } => {
                assert_eq!(iterations, Some(25));
                assert_eq!(seed, Some(9));
                assert_eq!(sort_by, "final_equity");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn backtest_requires_config() {
        assert!(Cli::try_parse_from(["bandsweep", "backtest"]).is_err());
    }

    #[test]
    fn missing_config_file_maps_to_parse_error() {
        let err = load_config(&PathBuf::from("/nonexistent/sweep.ini")).unwrap_err();
        assert!(matches!(err, SweepError::ConfigParse { .. }));
    }
}
