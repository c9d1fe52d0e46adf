//! Discrete signal columns derived from indicator series.

use crate::domain::indicator::IndicatorSeries;

pub const RSI_OVERSOLD: f64 = 20.0;
pub const RSI_OVERBOUGHT: f64 = 80.0;

/// +1 on a golden cross, -1 on a death cross, 0 otherwise.
///
/// Golden cross at i: `short[i-1] < long[i-1]` and `short[i] >= long[i]`.
/// Death cross at i: `short[i-1] > long[i-1]` and `short[i] <= long[i]`.
/// Any undefined input on either bar yields 0.
pub fn cross_signal(short: &IndicatorSeries, long: &IndicatorSeries) -> Vec<i8> {
    let len = short.len().min(long.len());
    let mut out = vec![0; len];

    for (i, slot) in out.iter_mut().enumerate().skip(1) {
        let (Some(ps), Some(pl), Some(s), Some(l)) =
            (short.get(i - 1), long.get(i - 1), short.get(i), long.get(i))
        else {
            continue;
        };
        if ps < pl && s >= l {
            *slot = 1;
        } else if ps > pl && s <= l {
            *slot = -1;
        }
    }
    out
}

/// +1 when RSI is oversold, -1 when overbought, 0 otherwise or undefined.
pub fn rsi_signal(rsi: &IndicatorSeries) -> Vec<i8> {
    rsi.values
        .iter()
        .map(|v| match v {
            Some(v) if *v < RSI_OVERSOLD => 1,
            Some(v) if *v > RSI_OVERBOUGHT => -1,
            _ => 0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::IndicatorType;

    fn series(values: Vec<Option<f64>>) -> IndicatorSeries {
        IndicatorSeries {
            indicator_type: IndicatorType::Sma(1),
            values,
        }
    }

    #[test]
    fn golden_and_death_cross() {
        let short = series(vec![Some(1.0), Some(3.0), Some(3.0), Some(1.0)]);
        let long = series(vec![Some(2.0), Some(2.0), Some(2.5), Some(2.5)]);
        assert_eq!(cross_signal(&short, &long), vec![0, 1, 0, -1]);
    }

    #[test]
    fn touching_from_below_counts_as_cross() {
        let short = series(vec![Some(1.0), Some(2.0)]);
        let long = series(vec![Some(2.0), Some(2.0)]);
        assert_eq!(cross_signal(&short, &long), vec![0, 1]);
    }

    #[test]
    fn undefined_values_never_cross() {
        let short = series(vec![None, Some(3.0), Some(1.0)]);
        let long = series(vec![None, None, Some(2.0)]);
        assert_eq!(cross_signal(&short, &long), vec![0, 0, 0]);
    }

    #[test]
    fn rsi_thresholds() {
        let rsi = series(vec![None, Some(10.0), Some(50.0), Some(90.0), Some(20.0)]);
        assert_eq!(rsi_signal(&rsi), vec![0, 1, 0, -1, 0]);
    }
}
