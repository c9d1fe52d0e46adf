//! RSI (Relative Strength Index) indicator implementation.
//!
//! Plain rolling means, no Wilder smoothing:
//! - change[i] = C[i] - C[i-1]
//! - RSI(d)[i] = 100 * mean(max(change, 0)) / (mean(|change|) + 1e-10)
//!
//! over the d changes ending at i. The epsilon keeps a flat window at 0 instead
//! of dividing by zero.
//!
//! Warmup: first d bars are undefined (need d price changes).

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub const RSI_EPSILON: f64 = 1e-10;

/// Period of the RSI columns in a run export.
pub const DEFAULT_RSI_PERIOD: usize = 14;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.len() < 2 {
        return IndicatorSeries::undefined(IndicatorType::Rsi(period), bars.len());
    }

    let mut values = Vec::with_capacity(bars.len());
    values.push(None);

    let changes: Vec<f64> = bars.windows(2).map(|w| w[1].close - w[0].close).collect();

    for i in 1..bars.len() {
        // changes[i - 1] is the change ending at bar i
        if i < period {
            values.push(None);
            continue;
        }

        let window = &changes[i - period..i];
        let avg_gain = window.iter().map(|c| c.max(0.0)).sum::<f64>() / period as f64;
        let avg_move = window.iter().map(|c| c.abs()).sum::<f64>() / period as f64;

        values.push(Some(100.0 * avg_gain / (avg_move + RSI_EPSILON)));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(date: &str, close: f64) -> OhlcvBar {
        OhlcvBar {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: Some(1000),
        }
    }

    fn make_series(closes: &[f64]) -> Vec<OhlcvBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| make_bar(&format!("2024-01-{:02}", i + 1), c))
            .collect()
    }

    #[test]
    fn rsi_empty_bars() {
        let series = calculate_rsi(&[], 14);
        assert_eq!(series.values.len(), 0);
    }

    #[test]
    fn rsi_single_bar() {
        let bars = vec![make_bar("2024-01-01", 100.0)];
        let series = calculate_rsi(&bars, 14);
        assert_eq!(series.values, vec![None]);
    }

    #[test]
    fn rsi_warmup_period() {
        let bars = make_series(&[1.0, 2.0, 3.0, 2.0, 4.0]);
        let series = calculate_rsi(&bars, 3);

        assert_eq!(series.values.len(), 5);
        for i in 0..3 {
            assert!(series.values[i].is_none(), "Bar {} should be undefined", i);
        }
        assert!(series.values[3].is_some());
        assert!(series.values[4].is_some());
    }

    #[test]
    fn rsi_known_values() {
        // changes: +1, +1, -1, +2
        let bars = make_series(&[1.0, 2.0, 3.0, 2.0, 4.0]);
        let series = calculate_rsi(&bars, 3);

        // window (+1, +1, -1): gains 2/3, moves 3/3
        let expected = 100.0 * (2.0 / 3.0) / (1.0 + RSI_EPSILON);
        assert!((series.get(3).unwrap() - expected).abs() < 1e-9);

        // window (+1, -1, +2): gains 3/3, moves 4/3
        let expected = 100.0 * 1.0 / (4.0 / 3.0 + RSI_EPSILON);
        assert!((series.get(4).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn rsi_all_gains_near_hundred() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&make_series(&closes), 14);
        assert!((series.get(14).unwrap() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&make_series(&closes), 14);
        assert!(series.get(14).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_flat_window_is_zero_not_nan() {
        let series = calculate_rsi(&make_series(&[50.0; 6]), 3);
        let value = series.get(5).unwrap();
        assert!(value.is_finite());
        assert!(value.abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_in_range() {
        let closes: Vec<f64> = (1..=20)
            .map(|i| 100.0 + (i as f64 % 7.0 - 3.0) * 2.0)
            .collect();
        let series = calculate_rsi(&make_series(&closes), 14);
        for rsi in series.values.iter().flatten() {
            assert!((0.0..=100.0).contains(rsi), "RSI {} out of range", rsi);
        }
    }

    #[test]
    fn rsi_zero_period() {
        let bars = make_series(&[100.0, 101.0]);
        let series = calculate_rsi(&bars, 0);
        assert_eq!(series.values, vec![None, None]);
        assert_eq!(series.indicator_type, IndicatorType::Rsi(0));
    }
}
