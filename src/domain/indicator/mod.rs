//! Technical indicators.
//!
//! Each indicator consumes the full bar sequence and produces one position
//! per bar plus a terminal reading (`score`) whose meaning is specific to the
//! indicator (last J for KDJ, last moving average value for SMA/EMA, ...).
//!
//! - [`Indicator`]: the pluggable unit, looked up by its stable key
//! - [`IndicatorGroup`]: bucket consumed by the composite scorer
//! - [`IndicatorResult`]: validated, immutable output for one key

pub mod bull_bear_power;
pub mod cci;
pub mod kdj;
pub mod macd;
pub mod moving_average;
pub mod rsi;
pub mod williams_r;

use std::fmt;

use crate::domain::error::EngineError;
use crate::domain::ohlcv::Bar;
use crate::domain::position::{trailing_run, Position, PositionSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorGroup {
    /// Trend-following moving-average group (`ma_*` in score records).
    Base,
    /// Momentum/oscillator group (`in_*` in score records).
    Power,
}

impl fmt::Display for IndicatorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorGroup::Base => write!(f, "BASE"),
            IndicatorGroup::Power => write!(f, "POWER"),
        }
    }
}

/// Raw output of [`Indicator::calculate`].
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorOutput {
    pub positions: PositionSeries,
    pub score: f64,
}

impl IndicatorOutput {
    pub fn empty() -> Self {
        IndicatorOutput {
            positions: Vec::new(),
            score: 0.0,
        }
    }
}

pub trait Indicator: Send + Sync {
    /// Stable identifier used for storage and lookup.
    fn key(&self) -> String;

    fn group(&self) -> IndicatorGroup;

    fn calculate(&self, bars: &[Bar]) -> IndicatorOutput;
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorResult {
    pub key: String,
    pub group: IndicatorGroup,
    pub positions: PositionSeries,
    /// Last computed reading.
    pub score: f64,
    /// Position at the last bar.
    pub status: Position,
    /// Number of trailing bars holding `status`.
    pub days: usize,
}

impl IndicatorResult {
    /// Validate `output` against the bar count and wrap it.
    pub fn new(
        key: String,
        group: IndicatorGroup,
        output: IndicatorOutput,
        bar_count: usize,
    ) -> Result<Self, EngineError> {
        if output.positions.len() != bar_count {
            return Err(EngineError::PositionLengthMismatch {
                key,
                expected: bar_count,
                actual: output.positions.len(),
            });
        }
        let status = output.positions.last().copied().unwrap_or_default();
        let days = trailing_run(&output.positions);
        Ok(IndicatorResult {
            key,
            group,
            positions: output.positions,
            score: output.score,
            status,
            days,
        })
    }
}

/// Run `indicator` over `bars` and validate the result.
pub fn evaluate(indicator: &dyn Indicator, bars: &[Bar]) -> Result<IndicatorResult, EngineError> {
    IndicatorResult::new(
        indicator.key(),
        indicator.group(),
        indicator.calculate(bars),
        bars.len(),
    )
}
