//! Strategy variants and their parameter sets.
//!
//! Each variant has a fixed list of named parameters ([`ParamSpec`]). A
//! [`ParameterSet`] is the untyped, ordered name→value form used by the
//! sensitivity driver and the report columns; [`Strategy`] is the typed form the
//! backtest engine runs.

use std::fmt;
use std::str::FromStr;

use super::error::SweepError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Breakout,
    DualMa,
    TripleMa,
    TrendReversion,
}

/// Admissible values for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDomain {
    /// Integer window length, at least 1.
    Window,
    /// Continuous, strictly positive.
    Positive,
    /// Continuous, zero or greater.
    NonNegative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub domain: ParamDomain,
}

impl ParamSpec {
    const fn window(name: &'static str) -> Self {
        Self {
            name,
            domain: ParamDomain::Window,
        }
    }

    const fn positive(name: &'static str) -> Self {
        Self {
            name,
            domain: ParamDomain::Positive,
        }
    }

    const fn non_negative(name: &'static str) -> Self {
        Self {
            name,
            domain: ParamDomain::NonNegative,
        }
    }

    pub fn is_integer(&self) -> bool {
        self.domain == ParamDomain::Window
    }

    pub fn check(&self, value: f64) -> Result<(), SweepError> {
        let ok = value.is_finite()
            && match self.domain {
                ParamDomain::Window => value >= 1.0 && value.fract() == 0.0,
                ParamDomain::Positive => value > 0.0,
                ParamDomain::NonNegative => value >= 0.0,
            };
        if ok {
            Ok(())
        } else {
            let expected = match self.domain {
                ParamDomain::Window => "a positive integer",
                ParamDomain::Positive => "positive",
                ParamDomain::NonNegative => "non-negative",
            };
            Err(SweepError::configuration(format!(
                "{} must be {}, got {}",
                self.name, expected, value
            )))
        }
    }
}

const BREAKOUT_PARAMS: &[ParamSpec] = &[
    ParamSpec::window("bb_period"),
    ParamSpec::positive("bb_std"),
    ParamSpec::non_negative("drop_threshold"),
];

const DUAL_MA_PARAMS: &[ParamSpec] = &[
    ParamSpec::window("short_ma_period"),
    ParamSpec::window("long_ma_period"),
];

const TRIPLE_MA_PARAMS: &[ParamSpec] = &[
    ParamSpec::window("ma_short"),
    ParamSpec::window("ma_medium"),
    ParamSpec::window("ma_long"),
];

const TREND_REVERSION_PARAMS: &[ParamSpec] = &[
    ParamSpec::window("bb_period"),
    ParamSpec::positive("bb_std"),
    ParamSpec::window("ma_long_period"),
];

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Breakout,
        StrategyKind::DualMa,
        StrategyKind::TripleMa,
        StrategyKind::TrendReversion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Breakout => "breakout",
            StrategyKind::DualMa => "dual_ma",
            StrategyKind::TripleMa => "triple_ma",
            StrategyKind::TrendReversion => "trend_reversion",
        }
    }

    /// Parameters sampled by the sensitivity driver, in column order.
    pub fn param_specs(self) -> &'static [ParamSpec] {
        match self {
            StrategyKind::Breakout => BREAKOUT_PARAMS,
            StrategyKind::DualMa => DUAL_MA_PARAMS,
            StrategyKind::TripleMa => TRIPLE_MA_PARAMS,
            StrategyKind::TrendReversion => TREND_REVERSION_PARAMS,
        }
    }

    pub fn param_spec(self, name: &str) -> Option<&'static ParamSpec> {
        self.param_specs().iter().find(|s| s.name == name)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.name() == key)
            .ok_or_else(|| {
                SweepError::configuration(format!(
                    "unknown strategy '{}', expected one of: breakout, dual_ma, triple_ma, trend_reversion",
                    s.trim()
                ))
            })
    }
}

/// Ordered parameter name → value mapping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterSet {
    values: Vec<(String, f64)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or overwrite; a new name keeps insertion order.
    pub fn insert(&mut self, name: &str, value: f64) {
        match self.values.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakoutParams {
    pub bb_period: usize,
    pub bb_std: f64,
    pub drop_threshold: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DualMaParams {
    pub short_ma_period: usize,
    pub long_ma_period: usize,
    /// Minimum bias (percent over the long MA) on the signal bar; `None` disables the filter.
    pub bias_threshold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TripleMaParams {
    pub ma_short: usize,
    pub ma_medium: usize,
    pub ma_long: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendReversionParams {
    pub bb_period: usize,
    pub bb_std: f64,
    pub ma_long_period: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Breakout(BreakoutParams),
    DualMa(DualMaParams),
    TripleMa(TripleMaParams),
    TrendReversion(TrendReversionParams),
}

impl Strategy {
    pub fn default_for(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Breakout => Strategy::Breakout(BreakoutParams {
                bb_period: 20,
                bb_std: 2.0,
                drop_threshold: 0.5,
            }),
            StrategyKind::DualMa => Strategy::DualMa(DualMaParams {
                short_ma_period: 5,
                long_ma_period: 20,
                bias_threshold: None,
            }),
            StrategyKind::TripleMa => Strategy::TripleMa(TripleMaParams {
                ma_short: 3,
                ma_medium: 5,
                ma_long: 10,
            }),
            StrategyKind::TrendReversion => Strategy::TrendReversion(TrendReversionParams {
                bb_period: 5,
                bb_std: 2.0,
                ma_long_period: 10,
            }),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Breakout(_) => StrategyKind::Breakout,
            Strategy::DualMa(_) => StrategyKind::DualMa,
            Strategy::TripleMa(_) => StrategyKind::TripleMa,
            Strategy::TrendReversion(_) => StrategyKind::TrendReversion,
        }
    }

    /// Build a validated strategy from named parameters.
    pub fn from_params(kind: StrategyKind, params: &ParameterSet) -> Result<Self, SweepError> {
        let strategy = Self::assemble(kind, params)?;
        strategy.validate()?;
        Ok(strategy)
    }

    /// Build a strategy from named parameters without the ordering check.
    ///
    /// Every parameter in [`StrategyKind::param_specs`] must be present and
    /// within its domain. The optional `bias_threshold` is read for `dual_ma`
    /// when supplied.
    pub fn assemble(kind: StrategyKind, params: &ParameterSet) -> Result<Self, SweepError> {
        let require = |name: &str| -> Result<f64, SweepError> {
            let value = params.get(name).ok_or_else(|| {
                SweepError::configuration(format!("{} requires parameter {}", kind, name))
            })?;
            if let Some(spec) = kind.param_spec(name) {
                spec.check(value)?;
            }
            Ok(value)
        };
        let window = |name: &str| require(name).map(|v| v as usize);

        let strategy = match kind {
            StrategyKind::Breakout => Strategy::Breakout(BreakoutParams {
                bb_period: window("bb_period")?,
                bb_std: require("bb_std")?,
                drop_threshold: require("drop_threshold")?,
            }),
            StrategyKind::DualMa => Strategy::DualMa(DualMaParams {
                short_ma_period: window("short_ma_period")?,
                long_ma_period: window("long_ma_period")?,
                bias_threshold: params.get("bias_threshold"),
            }),
            StrategyKind::TripleMa => Strategy::TripleMa(TripleMaParams {
                ma_short: window("ma_short")?,
                ma_medium: window("ma_medium")?,
                ma_long: window("ma_long")?,
            }),
            StrategyKind::TrendReversion => Strategy::TrendReversion(TrendReversionParams {
                bb_period: window("bb_period")?,
                bb_std: require("bb_std")?,
                ma_long_period: window("ma_long_period")?,
            }),
        };

        Ok(strategy)
    }

    pub fn to_params(&self) -> ParameterSet {
        match self {
            Strategy::Breakout(p) => ParameterSet::new()
                .with("bb_period", p.bb_period as f64)
                .with("bb_std", p.bb_std)
                .with("drop_threshold", p.drop_threshold),
            Strategy::DualMa(p) => {
                let mut set = ParameterSet::new()
                    .with("short_ma_period", p.short_ma_period as f64)
                    .with("long_ma_period", p.long_ma_period as f64);
                if let Some(t) = p.bias_threshold {
                    set.insert("bias_threshold", t);
                }
                set
            }
            Strategy::TripleMa(p) => ParameterSet::new()
                .with("ma_short", p.ma_short as f64)
                .with("ma_medium", p.ma_medium as f64)
                .with("ma_long", p.ma_long as f64),
            Strategy::TrendReversion(p) => ParameterSet::new()
                .with("bb_period", p.bb_period as f64)
                .with("bb_std", p.bb_std)
                .with("ma_long_period", p.ma_long_period as f64),
        }
    }

    /// The variant's ordering constraint between windows.
    pub fn satisfies_ordering(&self) -> bool {
        match self {
            Strategy::DualMa(p) => p.short_ma_period < p.long_ma_period,
            Strategy::TripleMa(p) => p.ma_short < p.ma_medium && p.ma_medium < p.ma_long,
            Strategy::Breakout(_) | Strategy::TrendReversion(_) => true,
        }
    }

    /// Check parameter domains and the ordering constraint.
    pub fn validate(&self) -> Result<(), SweepError> {
        let kind = self.kind();
        for (name, value) in self.to_params().iter() {
            if let Some(spec) = kind.param_spec(name) {
                spec.check(value)?;
            }
        }
        if !self.satisfies_ordering() {
            return Err(SweepError::configuration(format!(
                "{} parameters violate the window ordering: {}",
                kind,
                describe(&self.to_params())
            )));
        }
        Ok(())
    }

    /// Longest window any of the variant's indicators needs.
    pub fn lookback(&self) -> usize {
        match self {
            Strategy::Breakout(p) => p.bb_period,
            Strategy::DualMa(p) => p.short_ma_period.max(p.long_ma_period),
            Strategy::TripleMa(p) => p.ma_short.max(p.ma_medium).max(p.ma_long),
            Strategy::TrendReversion(p) => p.ma_long_period,
        }
    }
}

pub(crate) fn describe(params: &ParameterSet) -> String {
    params
        .iter()
        .map(|(n, v)| format!("{}={}", n, v))
        .collect::<Vec<_>>()
        .join(", ")
}
