//! CSV file bar loader.
//!
//! Columns are found by header name, case-insensitively. English headers and
//! the Taiwan exchange export headers are both recognised:
//!
//! | field  | headers                        |
//! |--------|--------------------------------|
//! | date   | `date`, `日期`, `年月日`          |
//! | open   | `open`, `開盤價`                 |
//! | high   | `high`, `最高價`                 |
//! | low    | `low`, `最低價`                  |
//! | close  | `close`, `收盤價`                |
//! | volume | `volume`, `成交股數`, `成交量` (optional) |

use crate::domain::error::SweepError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use tracing::info;

const DATE_HEADERS: &[&str] = &["date", "日期", "年月日"];
const OPEN_HEADERS: &[&str] = &["open", "開盤價"];
const HIGH_HEADERS: &[&str] = &["high", "最高價"];
const LOW_HEADERS: &[&str] = &["low", "最低價"];
const CLOSE_HEADERS: &[&str] = &["close", "收盤價"];
const VOLUME_HEADERS: &[&str] = &["volume", "成交股數", "成交量"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

#[derive(Debug, Default)]
pub struct CsvAdapter;

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl CsvAdapter {
    pub fn new() -> Self {
        Self
    }

    fn locate(headers: &csv::StringRecord) -> Result<Columns, SweepError> {
        let find = |aliases: &[&str]| {
            headers.iter().position(|h| {
                let h = h.trim().trim_start_matches('\u{feff}').to_lowercase();
                aliases.iter().any(|a| *a == h)
            })
        };
        let require = |aliases: &[&str]| {
            find(aliases).ok_or_else(|| {
                SweepError::data(format!("missing {} column", aliases[0]))
            })
        };

        Ok(Columns {
            date: require(DATE_HEADERS)?,
            open: require(OPEN_HEADERS)?,
            high: require(HIGH_HEADERS)?,
            low: require(LOW_HEADERS)?,
            close: require(CLOSE_HEADERS)?,
            volume: find(VOLUME_HEADERS),
        })
    }

    pub fn parse(content: &str) -> Result<Vec<OhlcvBar>, SweepError> {
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let columns = Self::locate(rdr.headers()?)?;
        let mut bars = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            let record = result?;
            let line = row + 2;
            let field = |idx: usize, name: &str| {
                record
                    .get(idx)
                    .ok_or_else(|| SweepError::data(format!("line {}: missing {} value", line, name)))
            };
            let price = |idx: usize, name: &str| -> Result<f64, SweepError> {
                let raw = field(idx, name)?;
                parse_number(raw).ok_or_else(|| {
                    SweepError::data(format!("line {}: invalid {} value {:?}", line, name, raw))
                })
            };

            let date_str = field(columns.date, "date")?;
            let date = parse_date(date_str).ok_or_else(|| {
                SweepError::data(format!("line {}: invalid date {:?}", line, date_str))
            })?;

            let volume = match columns.volume {
                Some(idx) => record
                    .get(idx)
                    .and_then(parse_number)
                    .map(|v| v as i64),
                None => None,
            };

            bars.push(OhlcvBar {
                date,
                open: price(columns.open, "open")?,
                high: price(columns.high, "high")?,
                low: price(columns.low, "low")?,
                close: price(columns.close, "close")?,
                volume,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().replace(',', "").parse().ok()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

impl DataPort for CsvAdapter {
    fn load_bars(&self, source: &str) -> Result<Vec<OhlcvBar>, SweepError> {
        let content = fs::read_to_string(source)
            .map_err(|e| SweepError::data(format!("failed to read {}: {}", source, e)))?;
        let bars = Self::parse(&content)?;
        info!(path = source, bars = bars.len(), "loaded bar data");
        Ok(bars)
    }
}
