//! OHLCV bar representation.

use chrono::NaiveDate;

use super::error::SweepError;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<i64>,
}

impl OhlcvBar {
    /// (open + close) / 2
    pub fn mid_price(&self) -> f64 {
        (self.open + self.close) / 2.0
    }
}

/// Reject bars whose price fields are not finite numbers.
///
/// Runs before any simulation so that a bad dataset fails fast instead of
/// silently producing undefined indicator values.
pub fn validate_bars(bars: &[OhlcvBar]) -> Result<(), SweepError> {
    for (i, bar) in bars.iter().enumerate() {
        let fields = [
            ("open", bar.open),
            ("high", bar.high),
            ("low", bar.low),
            ("close", bar.close),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SweepError::data(format!(
                "bar {} ({}) has non-finite {}: {}",
                i, bar.date, name, value
            )));
        }
    }
    Ok(())
}
