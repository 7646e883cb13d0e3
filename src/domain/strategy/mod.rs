//! Trading strategies.
//!
//! A strategy turns the full bar sequence into one [`Position`] per bar. It
//! never looks ahead: the position at bar `i` depends only on bars `0..=i`.
//! Tunable constants are exposed as a flat name -> value map so they can be
//! overridden from configuration without the engine knowing the fields.

pub mod cci_ma;
pub mod cci_macd;
pub mod cci_wma;
pub mod channel;
pub mod ma_base;

use std::collections::BTreeMap;

use crate::domain::error::EngineError;
use crate::domain::ohlcv::Bar;
use crate::domain::position::PositionSeries;

/// Parameter name -> value. Integer parameters are carried as whole floats.
pub type StrategyParams = BTreeMap<String, f64>;

pub trait Strategy: Send + Sync {
    fn key(&self) -> String;

    fn params(&self) -> StrategyParams {
        StrategyParams::new()
    }

    /// Override a subset of [`Strategy::params`]. Unknown names are rejected.
    fn set_params(&mut self, params: &StrategyParams) -> Result<(), EngineError> {
        match params.keys().next() {
            Some(name) => Err(unknown_param(&self.key(), name)),
            None => Ok(()),
        }
    }

    fn calculate(&self, bars: &[Bar]) -> PositionSeries;
}

/// Run `strategy` over `bars`, rejecting output that is not index-aligned.
pub fn evaluate(strategy: &dyn Strategy, bars: &[Bar]) -> Result<PositionSeries, EngineError> {
    let positions = strategy.calculate(bars);
    if positions.len() != bars.len() {
        return Err(EngineError::PositionLengthMismatch {
            key: strategy.key(),
            expected: bars.len(),
            actual: positions.len(),
        });
    }
    Ok(positions)
}

pub(crate) fn unknown_param(key: &str, name: &str) -> EngineError {
    EngineError::InvalidParam {
        key: key.to_string(),
        param: name.to_string(),
        reason: "unknown parameter".into(),
    }
}

/// Window length parameter: a whole number >= 1.
pub(crate) fn period_param(key: &str, name: &str, value: f64) -> Result<usize, EngineError> {
    if !value.is_finite() || value < 1.0 || value.fract() != 0.0 {
        return Err(EngineError::InvalidParam {
            key: key.to_string(),
            param: name.to_string(),
            reason: format!("expected a whole number >= 1, got {value}"),
        });
    }
    Ok(value as usize)
}

/// Count parameter: a whole number >= 0.
pub(crate) fn count_param(key: &str, name: &str, value: f64) -> Result<usize, EngineError> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(EngineError::InvalidParam {
            key: key.to_string(),
            param: name.to_string(),
            reason: format!("expected a whole number >= 0, got {value}"),
        });
    }
    Ok(value as usize)
}

/// Scale parameter: finite and strictly positive.
pub(crate) fn positive_param(key: &str, name: &str, value: f64) -> Result<f64, EngineError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(EngineError::InvalidParam {
            key: key.to_string(),
            param: name.to_string(),
            reason: format!("expected a positive number, got {value}"),
        });
    }
    Ok(value)
}
