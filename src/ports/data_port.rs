//! Bar history port trait.

use chrono::NaiveDate;

use crate::domain::error::EngineError;
use crate::domain::ohlcv::Bar;

/// Supplies daily bars for one symbol.
///
/// Bars come back ascending by `time_key` with no duplicates, limited to
/// `start_date..=end_date`. An empty vector is a valid answer. Retries, if
/// any, belong to the implementation.
pub trait BarProvider: Send + Sync {
    fn get_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Bar>, EngineError>;

    fn list_symbols(&self) -> Result<Vec<String>, EngineError>;
}
