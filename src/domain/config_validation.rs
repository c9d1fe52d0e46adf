//! Configuration validation and assembly.
//!
//! Reads the `[data]`, `[strategy]`, `[backtest]`, `[sensitivity]` and
//! `[ranges]` sections and fails before any run when a value is unusable.

use crate::domain::backtest::{BacktestConfig, EndOfData};
use crate::domain::error::SweepError;
use crate::domain::sensitivity::{ParamRange, ParamRanges, SensitivityDriver, DEFAULT_MAX_ATTEMPTS};
use crate::domain::strategy::{ParameterSet, Strategy, StrategyKind};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_ITERATIONS: i64 = 100;
pub const DEFAULT_SEED: i64 = 42;

const BIAS_THRESHOLD: &str = "bias_threshold";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSettings {
    pub iterations: usize,
    pub seed: u64,
    pub max_attempts: usize,
    pub parallel: bool,
}

/// Check every section used by the `backtest` and `sensitivity` commands.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), SweepError> {
    data_path(config)?;
    strategy_from_config(config)?;
    backtest_config(config)?;
    sensitivity_driver(config)?;
    Ok(())
}

pub fn data_path(config: &dyn ConfigPort) -> Result<String, SweepError> {
    match config.get_string("data", "path") {
        Some(p) if !p.trim().is_empty() => Ok(p.trim().to_string()),
        _ => Err(SweepError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        }),
    }
}

pub fn strategy_kind(config: &dyn ConfigPort) -> Result<StrategyKind, SweepError> {
    let kind = config
        .get_string("strategy", "kind")
        .ok_or_else(|| SweepError::ConfigMissing {
            section: "strategy".to_string(),
            key: "kind".to_string(),
        })?;
    kind.parse().map_err(|e: SweepError| invalid("strategy", "kind", e))
}

/// Variant defaults overridden by any parameter keys in `[strategy]`.
pub fn strategy_from_config(config: &dyn ConfigPort) -> Result<Strategy, SweepError> {
    let kind = strategy_kind(config)?;
    let mut params = Strategy::default_for(kind).to_params();

    for key in config.keys("strategy") {
        if key == "kind" || config.get_string("strategy", &key).is_none() {
            continue;
        }
        if kind.param_spec(&key).is_none() && !accepts_bias_threshold(kind, &key) {
            return Err(SweepError::ConfigInvalid {
                section: "strategy".to_string(),
                key,
                reason: format!("not a {} parameter", kind),
            });
        }
        let value = parse_number(config, "strategy", &key)?;
        params.insert(&key, value);
    }

    Strategy::from_params(kind, &params)
}

fn accepts_bias_threshold(kind: StrategyKind, key: &str) -> bool {
    kind == StrategyKind::DualMa && key == BIAS_THRESHOLD
}

pub fn backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, SweepError> {
    let end_of_data = match config.get_string("backtest", "end_of_data") {
        None => EndOfData::HoldOpen,
        Some(v) => match v.trim().to_lowercase().as_str() {
            "hold" | "hold_open" => EndOfData::HoldOpen,
            "liquidate" => EndOfData::Liquidate,
            other => {
                return Err(SweepError::ConfigInvalid {
                    section: "backtest".to_string(),
                    key: "end_of_data".to_string(),
                    reason: format!("expected hold or liquidate, got {}", other),
                });
            }
        },
    };
    Ok(BacktestConfig { end_of_data })
}

pub fn sweep_settings(config: &dyn ConfigPort) -> Result<SweepSettings, SweepError> {
    let iterations = config.get_int("sensitivity", "iterations", DEFAULT_ITERATIONS);
    if iterations < 1 {
        return Err(SweepError::ConfigInvalid {
            section: "sensitivity".to_string(),
            key: "iterations".to_string(),
            reason: "iterations must be at least 1".to_string(),
        });
    }

    let seed = config.get_int("sensitivity", "seed", DEFAULT_SEED);
    if seed < 0 {
        return Err(SweepError::ConfigInvalid {
            section: "sensitivity".to_string(),
            key: "seed".to_string(),
            reason: "seed must be non-negative".to_string(),
        });
    }

    let max_attempts = config.get_int("sensitivity", "max_attempts", DEFAULT_MAX_ATTEMPTS as i64);
    if max_attempts < 1 {
        return Err(SweepError::ConfigInvalid {
            section: "sensitivity".to_string(),
            key: "max_attempts".to_string(),
            reason: "max_attempts must be at least 1".to_string(),
        });
    }

    Ok(SweepSettings {
        iterations: iterations as usize,
        seed: seed as u64,
        max_attempts: max_attempts as usize,
        parallel: config.get_bool("sensitivity", "parallel", false),
    })
}

/// Variant default ranges overridden by `[ranges] name = min, max` entries.
pub fn ranges_from_config(
    config: &dyn ConfigPort,
    kind: StrategyKind,
) -> Result<ParamRanges, SweepError> {
    let mut ranges = ParamRanges::default_for(kind);
    for key in config.keys("ranges") {
        let raw = config.get_string("ranges", &key).unwrap_or_default();
        let range = parse_range(&raw).ok_or_else(|| SweepError::ConfigInvalid {
            section: "ranges".to_string(),
            key: key.clone(),
            reason: format!("expected \"min, max\", got {:?}", raw),
        })?;
        ranges.insert(&key, range);
    }
    Ok(ranges)
}

fn parse_range(raw: &str) -> Option<ParamRange> {
    let (min, max) = raw.split_once(',')?;
    let min = min.trim().parse().ok()?;
    let max = max.trim().parse().ok()?;
    Some(ParamRange::new(min, max))
}

/// Driver for the configured variant with ranges, sweep settings, the
/// end-of-data mode and any fixed `bias_threshold` applied.
pub fn sensitivity_driver(config: &dyn ConfigPort) -> Result<SensitivityDriver, SweepError> {
    let strategy = strategy_from_config(config)?;
    let kind = strategy.kind();
    let settings = sweep_settings(config)?;
    let ranges = ranges_from_config(config, kind)?;

    let mut fixed = ParameterSet::new();
    if let Some(t) = strategy.to_params().get(BIAS_THRESHOLD) {
        fixed.insert(BIAS_THRESHOLD, t);
    }

    Ok(SensitivityDriver::new(kind, ranges)?
        .with_max_attempts(settings.max_attempts)
        .with_parallelism(settings.parallel)
        .with_fixed_params(fixed)
        .with_backtest_config(backtest_config(config)?))
}

fn parse_number(config: &dyn ConfigPort, section: &str, key: &str) -> Result<f64, SweepError> {
    let raw = config.get_string(section, key).unwrap_or_default();
    raw.trim().parse().map_err(|_| SweepError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: format!("expected a number, got {:?}", raw),
    })
}

fn invalid(section: &str, key: &str, err: SweepError) -> SweepError {
    let reason = match err {
        SweepError::Configuration { reason } => reason,
        other => other.to_string(),
    };
    SweepError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const VALID: &str = r#"
[data]
path = data/prices.csv

[strategy]
kind = dual_ma
short_ma_period = 4
long_ma_period = 12

[sensitivity]
iterations = 20
seed = 7
max_attempts = 500
parallel = true

[ranges]
short_ma_period = 2, 6
"#;

    #[test]
    fn valid_config_passes() {
        let config = make_config(VALID);
        assert!(validate_config(&config).is_ok());
        assert_eq!(data_path(&config).unwrap(), "data/prices.csv");
    }

    #[test]
    fn strategy_parameters_override_defaults() {
        let strategy = strategy_from_config(&make_config(VALID)).unwrap();
        let params = strategy.to_params();
        assert_eq!(params.get("short_ma_period"), Some(4.0));
        assert_eq!(params.get("long_ma_period"), Some(12.0));
    }

    #[test]
    fn missing_kind_is_reported() {
        let config = make_config("[data]\npath = x.csv\n[strategy]\nshort_ma_period = 3\n");
        let err = strategy_from_config(&config).unwrap_err();
        assert!(matches!(err, SweepError::ConfigMissing { key, .. } if key == "kind"));
    }

    #[test]
    fn unknown_kind_is_invalid() {
        let config = make_config("[strategy]\nkind = martingale\n");
        let err = strategy_kind(&config).unwrap_err();
        assert!(matches!(err, SweepError::ConfigInvalid { key, .. } if key == "kind"));
    }

    #[test]
    fn foreign_parameter_is_invalid() {
        let config = make_config("[strategy]\nkind = triple_ma\nbb_std = 2.0\n");
        let err = strategy_from_config(&config).unwrap_err();
        assert!(matches!(err, SweepError::ConfigInvalid { key, .. } if key == "bb_std"));
    }

    #[test]
    fn non_numeric_parameter_is_invalid() {
        let config = make_config("[strategy]\nkind = breakout\nbb_std = wide\n");
        let err = strategy_from_config(&config).unwrap_err();
        assert!(matches!(err, SweepError::ConfigInvalid { key, .. } if key == "bb_std"));
    }

    #[test]
    fn ordering_violation_is_configuration_error() {
        let config =
            make_config("[strategy]\nkind = dual_ma\nshort_ma_period = 30\nlong_ma_period = 10\n");
        let err = strategy_from_config(&config).unwrap_err();
        assert!(matches!(err, SweepError::Configuration { .. }));
    }

    #[test]
    fn blank_bias_threshold_is_unset() {
        let config = make_config("[strategy]\nkind = dual_ma\nbias_threshold =\n");
        let strategy = strategy_from_config(&config).unwrap();
        assert_eq!(strategy.to_params().get("bias_threshold"), None);
    }

    #[test]
    fn bias_threshold_only_for_dual_ma() {
        let config = make_config("[strategy]\nkind = dual_ma\nbias_threshold = 5\n");
        let strategy = strategy_from_config(&config).unwrap();
        assert_eq!(strategy.to_params().get("bias_threshold"), Some(5.0));

        let config = make_config("[strategy]\nkind = triple_ma\nbias_threshold = 5\n");
        assert!(strategy_from_config(&config).is_err());
    }

    #[test]
    fn sweep_settings_defaults() {
        let settings = sweep_settings(&make_config("[sensitivity]\n")).unwrap();
        assert_eq!(
            settings,
            SweepSettings {
                iterations: 100,
                seed: 42,
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                parallel: false,
            }
        );
    }

    #[test]
    fn sweep_settings_from_file() {
        let settings = sweep_settings(&make_config(VALID)).unwrap();
        assert_eq!(settings.iterations, 20);
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.max_attempts, 500);
        assert!(settings.parallel);
    }

    #[test]
    fn zero_iterations_is_invalid() {
        let err = sweep_settings(&make_config("[sensitivity]\niterations = 0\n")).unwrap_err();
        assert!(matches!(err, SweepError::ConfigInvalid { key, .. } if key == "iterations"));
    }

    #[test]
    fn negative_seed_is_invalid() {
        let err = sweep_settings(&make_config("[sensitivity]\nseed = -1\n")).unwrap_err();
        assert!(matches!(err, SweepError::ConfigInvalid { key, .. } if key == "seed"));
    }

    #[test]
    fn ranges_override_defaults() {
        let ranges = ranges_from_config(&make_config(VALID), StrategyKind::DualMa).unwrap();
        assert_eq!(ranges.get("short_ma_period"), Some(ParamRange::new(2.0, 6.0)));
        assert_eq!(ranges.get("long_ma_period"), Some(ParamRange::new(15.0, 30.0)));
    }

    #[test]
    fn malformed_range_is_invalid() {
        let config = make_config("[ranges]\nshort_ma_period = 3 to 5\n");
        let err = ranges_from_config(&config, StrategyKind::DualMa).unwrap_err();
        assert!(matches!(err, SweepError::ConfigInvalid { key, .. } if key == "short_ma_period"));
    }

    #[test]
    fn inverted_range_fails_driver_construction() {
        let config = make_config("[strategy]\nkind = dual_ma\n[ranges]\nlong_ma_period = 30, 15\n");
        let err = sensitivity_driver(&config).unwrap_err();
        assert!(matches!(err, SweepError::Configuration { .. }));
    }

    #[test]
    fn end_of_data_mode() {
        let config = make_config("[backtest]\nend_of_data = liquidate\n");
        assert_eq!(backtest_config(&config).unwrap().end_of_data, EndOfData::Liquidate);
        assert_eq!(
            backtest_config(&make_config("[backtest]\n")).unwrap().end_of_data,
            EndOfData::HoldOpen
        );
        assert!(backtest_config(&make_config("[backtest]\nend_of_data = sell\n")).is_err());
    }

    #[test]
    fn missing_data_path_is_reported() {
        let err = data_path(&make_config("[strategy]\nkind = dual_ma\n")).unwrap_err();
        assert!(matches!(err, SweepError::ConfigMissing { section, .. } if section == "data"));
    }
}
