//! CSV bar history adapter.
//!
//! One file per symbol, `<dir>/<SYMBOL>.csv`, with a header row naming the
//! columns `time_key,open,high,low,close,volume[,turnover,turnover_rate]`
//! in any order. `time_key` may carry a time part (`2024-01-15 00:00:00`);
//! only the date is kept.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::error::EngineError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::BarProvider;

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    time_key: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
    turnover: Option<usize>,
    turnover_rate: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, EngineError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| EngineError::Data {
                reason: format!("missing {name} column"),
            })
        };
        Ok(Columns {
            time_key: require("time_key")?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: require("volume")?,
            turnover: find("turnover"),
            turnover_rate: find("turnover_rate"),
        })
    }
}

fn field<'r>(record: &'r StringRecord, index: usize, name: &str) -> Result<&'r str, EngineError> {
    record.get(index).map(str::trim).ok_or_else(|| EngineError::Data {
        reason: format!("missing {name} value"),
    })
}

fn number(record: &StringRecord, index: usize, name: &str) -> Result<f64, EngineError> {
    let raw = field(record, index, name)?;
    raw.parse().map_err(|e| EngineError::Data {
        reason: format!("invalid {name} value '{raw}': {e}"),
    })
}

fn optional_number(record: &StringRecord, index: Option<usize>, name: &str) -> Result<f64, EngineError> {
    match index {
        Some(i) if !field(record, i, name)?.is_empty() => number(record, i, name),
        _ => Ok(0.0),
    }
}

fn parse_time_key(raw: &str) -> Result<NaiveDate, EngineError> {
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|e| EngineError::Data {
        reason: format!("invalid time_key '{raw}': {e}"),
    })
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }
}

impl BarProvider for CsvAdapter {
    fn get_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Bar>, EngineError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| EngineError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| EngineError::Data {
            reason: format!("CSV header error: {e}"),
        })?;
        let columns = Columns::locate(headers)?;
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| EngineError::Data {
                reason: format!("CSV parse error: {e}"),
            })?;

            let time_key = parse_time_key(field(&record, columns.time_key, "time_key")?)?;
            if time_key < start_date || time_key > end_date {
                continue;
            }

            bars.push(Bar {
                time_key,
                open: number(&record, columns.open, "open")?,
                high: number(&record, columns.high, "high")?,
                low: number(&record, columns.low, "low")?,
                close: number(&record, columns.close, "close")?,
                volume: number(&record, columns.volume, "volume")?,
                turnover: optional_number(&record, columns.turnover, "turnover")?,
                turnover_rate: optional_number(&record, columns.turnover_rate, "turnover_rate")?,
            });
        }

        bars.sort_by_key(|b| b.time_key);
        if let Some(dup) = bars.windows(2).find(|w| w[0].time_key == w[1].time_key) {
            return Err(EngineError::Data {
                reason: format!("{symbol}: duplicate time_key {}", dup[1].time_key),
            });
        }
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, EngineError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| EngineError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
