#![allow(dead_code)]

use bandsweep::domain::error::SweepError;
pub use bandsweep::domain::ohlcv::OhlcvBar;
use bandsweep::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, source: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(source.to_string(), bars);
        self
    }
}

impl DataPort for MockDataPort {
    fn load_bars(&self, source: &str) -> Result<Vec<OhlcvBar>, SweepError> {
        self.data
            .get(source)
            .cloned()
            .ok_or_else(|| SweepError::data(format!("no bars for {}", source)))
    }
}

pub fn date(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64)
}

pub fn make_bar(i: usize, open: f64, high: f64, low: f64, close: f64) -> OhlcvBar {
    OhlcvBar {
        date: date(i),
        open,
        high,
        low,
        close,
        volume: Some(1_000),
    }
}

/// Bars with open = high = low = close.
pub fn flat_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c, c, c, c))
        .collect()
}

/// Bars whose open is the previous close and whose range spans both.
pub fn gapless_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let open = if i == 0 { c } else { closes[i - 1] };
            make_bar(i, open, open.max(c) * 1.01, open.min(c) * 0.99, c)
        })
        .collect()
}

/// Deterministic wavy uptrend, long enough for every default range.
pub fn wave_bars(n: usize) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..n)
        .map(|i| {
            let t = i as f64;
            100.0 + t * 0.15 + (t * 0.35).sin() * 6.0 + (t * 0.9).cos() * 2.0
        })
        .collect();
    gapless_bars(&closes)
}

/// CSV text in the English header layout.
pub fn bars_to_csv(bars: &[OhlcvBar]) -> String {
    let mut out = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date.format("%Y-%m-%d"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume.unwrap_or(0)
        ));
    }
    out
}
