//! Technical indicator implementations.
//!
//! Every indicator is a pure function of a bar slice and returns a series aligned
//! one-to-one with the bars. Positions before the window is full hold `None`
//! rather than a zero placeholder, and comparisons involving `None` are never
//! satisfied (see [`above`] and [`below`]).

pub mod bias;
pub mod bollinger;
pub mod prior_gain;
pub mod rsi;
pub mod signal;
pub mod sma;
pub mod stddev;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
    Bias(usize),
    PriorGain,
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Bias(period) => write!(f, "BIAS({})", period),
            IndicatorType::PriorGain => write!(f, "PRIOR_GAIN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn undefined(indicator_type: IndicatorType, len: usize) -> Self {
        Self {
            indicator_type,
            values: vec![None; len],
        }
    }

    /// Value at `index`, or `None` when undefined or out of range.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// `a > b`, false if either side is undefined.
pub fn above(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a > b)
}

/// `a < b`, false if either side is undefined.
pub fn below(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a < b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_type_display() {
        assert_eq!(IndicatorType::Sma(20).to_string(), "SMA(20)");
        assert_eq!(IndicatorType::Rsi(14).to_string(), "RSI(14)");
        assert_eq!(IndicatorType::Bias(20).to_string(), "BIAS(20)");
        assert_eq!(IndicatorType::PriorGain.to_string(), "PRIOR_GAIN");
    }

    #[test]
    fn get_out_of_range_is_undefined() {
        let series = IndicatorSeries {
            indicator_type: IndicatorType::Sma(2),
            values: vec![None, Some(1.5)],
        };
        assert_eq!(series.get(0), None);
        assert_eq!(series.get(1), Some(1.5));
        assert_eq!(series.get(2), None);
    }

    #[test]
    fn comparisons_with_undefined_are_false() {
        assert!(above(Some(2.0), Some(1.0)));
        assert!(!above(Some(1.0), Some(1.0)));
        assert!(!above(None, Some(1.0)));
        assert!(!above(Some(1.0), None));
        assert!(below(Some(1.0), Some(2.0)));
        assert!(!below(None, None));
    }
}
