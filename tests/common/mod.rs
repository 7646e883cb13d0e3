#![allow(dead_code)]

use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use tickscore::domain::backtest::StrategyResult;
use tickscore::domain::error::EngineError;
use tickscore::domain::indicator::IndicatorResult;
pub use tickscore::domain::ohlcv::Bar;
use tickscore::domain::score::ScoreRecord;
use tickscore::ports::data_port::BarProvider;
use tickscore::ports::result_port::ResultSink;

pub struct MockBarProvider {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockBarProvider {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl BarProvider for MockBarProvider {
    fn get_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Bar>, EngineError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(EngineError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.time_key >= start_date && b.time_key <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, EngineError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Keeps everything written to it, keyed by symbol.
#[derive(Default)]
pub struct RecordingSink {
    pub indicators: RefCell<BTreeMap<String, BTreeMap<String, IndicatorResult>>>,
    pub strategies: RefCell<BTreeMap<String, BTreeMap<String, StrategyResult>>>,
    pub scores: RefCell<BTreeMap<String, Vec<ScoreRecord>>>,
}

impl ResultSink for RecordingSink {
    fn write_indicators(
        &self,
        symbol: &str,
        results: &BTreeMap<String, IndicatorResult>,
    ) -> Result<(), EngineError> {
        self.indicators
            .borrow_mut()
            .insert(symbol.to_string(), results.clone());
        Ok(())
    }

    fn write_strategies(
        &self,
        symbol: &str,
        results: &BTreeMap<String, StrategyResult>,
    ) -> Result<(), EngineError> {
        self.strategies
            .borrow_mut()
            .insert(symbol.to_string(), results.clone());
        Ok(())
    }

    fn write_scores(&self, symbol: &str, scores: &[ScoreRecord]) -> Result<(), EngineError> {
        self.scores
            .borrow_mut()
            .insert(symbol.to_string(), scores.to_vec());
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One bar per day from 2024-01-01, open equal to close.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            time_key: date(2024, 1, 1) + chrono::Duration::days(i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 1000.0 + (i % 7) as f64 * 150.0,
            turnover: close * 1000.0,
            turnover_rate: 0.01,
        })
        .collect()
}

pub fn flat_bars(count: usize, price: f64) -> Vec<Bar> {
    (0..count)
        .map(|i| Bar {
            time_key: date(2024, 1, 1) + chrono::Duration::days(i as i64),
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 1000.0,
            turnover: price * 1000.0,
            turnover_rate: 0.01,
        })
        .collect()
}

/// Oscillating series with a slow upward drift.
pub fn wave_closes(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| 100.0 + 12.0 * ((i as f64) * 0.3).sin() + i as f64 * 0.05)
        .collect()
}
