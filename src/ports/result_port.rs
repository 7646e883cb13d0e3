//! Result persistence port trait.

use std::collections::BTreeMap;

use crate::domain::backtest::StrategyResult;
use crate::domain::engine::InstrumentReport;
use crate::domain::error::EngineError;
use crate::domain::indicator::IndicatorResult;
use crate::domain::score::ScoreRecord;

/// Receives finished, immutable engine output. How it is stored (and whether
/// existing rows are replaced) is up to the implementation.
pub trait ResultSink {
    fn write_indicators(
        &self,
        symbol: &str,
        results: &BTreeMap<String, IndicatorResult>,
    ) -> Result<(), EngineError>;

    /// Strategy summaries together with their trade ledgers.
    fn write_strategies(
        &self,
        symbol: &str,
        results: &BTreeMap<String, StrategyResult>,
    ) -> Result<(), EngineError>;

    fn write_scores(&self, symbol: &str, scores: &[ScoreRecord]) -> Result<(), EngineError>;

    fn write_report(&self, report: &InstrumentReport) -> Result<(), EngineError> {
        self.write_indicators(&report.symbol, &report.indicators)?;
        self.write_strategies(&report.symbol, &report.strategies)?;
        self.write_scores(&report.symbol, &report.scores)
    }
}
