//! Engine entry points.
//!
//! Pure computation over an ordered bar sequence: no I/O, no shared mutable
//! state. Indicators, strategies (with their backtests) and instruments are
//! independent units of work and run on the rayon pool when
//! [`EngineOptions::parallel`] is set. Outputs are keyed by `BTreeMap`, so
//! their order never depends on scheduling.
//!
//! An empty bar sequence is "nothing to compute" and yields empty output.
//! Integrity violations abort the whole instrument.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::backtest::{self, BacktestConfig, StrategyResult};
use crate::domain::error::EngineError;
use crate::domain::indicator::{self, Indicator, IndicatorGroup, IndicatorResult};
use crate::domain::ohlcv::{self, Bar};
use crate::domain::registry::{IndicatorRegistry, StrategyRegistry};
use crate::domain::score::{self, ScoreConfig, ScoreRecord, Signal};
use crate::domain::strategy::{self, Strategy};

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub parallel: bool,
    pub backtest: BacktestConfig,
    pub score: ScoreConfig,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            parallel: true,
            backtest: BacktestConfig::default(),
            score: ScoreConfig::default(),
        }
    }
}

impl EngineOptions {
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Everything computed for one instrument.
#[derive(Debug, Clone)]
pub struct InstrumentReport {
    pub symbol: String,
    pub indicators: BTreeMap<String, IndicatorResult>,
    pub strategies: BTreeMap<String, StrategyResult>,
    pub scores: Vec<ScoreRecord>,
}

impl InstrumentReport {
    pub fn latest_score(&self) -> Option<&ScoreRecord> {
        self.scores.last()
    }
}

fn check_order(bars: &[Bar]) -> Result<(), EngineError> {
    match ohlcv::first_unordered(bars) {
        Some(index) => Err(EngineError::UnorderedBars { index }),
        None => Ok(()),
    }
}

/// Evaluate every indicator in `registry`.
pub fn compute_indicators(
    bars: &[Bar],
    registry: &IndicatorRegistry,
    options: &EngineOptions,
) -> Result<BTreeMap<String, IndicatorResult>, EngineError> {
    check_order(bars)?;
    if bars.is_empty() {
        return Ok(BTreeMap::new());
    }

    let units: Vec<&dyn Indicator> = registry.iter().collect();
    let run = |unit: &&dyn Indicator| -> Result<IndicatorResult, EngineError> {
        let result = indicator::evaluate(*unit, bars)?;
        debug!(
            indicator = %result.key,
            status = %result.status,
            days = result.days,
            "indicator computed"
        );
        Ok(result)
    };

    let results: Vec<IndicatorResult> = if options.parallel {
        units.par_iter().map(run).collect::<Result<Vec<_>, EngineError>>()?
    } else {
        units.iter().map(run).collect::<Result<Vec<_>, EngineError>>()?
    };

    Ok(results.into_iter().map(|r| (r.key.clone(), r)).collect())
}

/// Evaluate every strategy in `registry` and backtest its positions.
pub fn compute_strategies(
    bars: &[Bar],
    registry: &StrategyRegistry,
    options: &EngineOptions,
) -> Result<BTreeMap<String, StrategyResult>, EngineError> {
    check_order(bars)?;
    if bars.is_empty() {
        return Ok(BTreeMap::new());
    }

    let units: Vec<&dyn Strategy> = registry.iter().collect();
    let run = |unit: &&dyn Strategy| -> Result<StrategyResult, EngineError> {
        let key = unit.key();
        let positions = strategy::evaluate(*unit, bars)?;
        let result = backtest::simulate(&key, &positions, bars, &options.backtest)?;
        debug!(
            strategy = %key,
            trades = result.stats.trades,
            net_profit = result.stats.net_profit,
            "strategy backtested"
        );
        Ok(result)
    };

    let results: Vec<StrategyResult> = if options.parallel {
        units.par_iter().map(run).collect::<Result<Vec<_>, EngineError>>()?
    } else {
        units.iter().map(run).collect::<Result<Vec<_>, EngineError>>()?
    };

    Ok(results.into_iter().map(|r| (r.key.clone(), r)).collect())
}

/// One [`ScoreRecord`] per bar from already computed results.
pub fn compute_score(
    bars: &[Bar],
    indicators: &BTreeMap<String, IndicatorResult>,
    strategies: &BTreeMap<String, StrategyResult>,
    config: &ScoreConfig,
) -> Result<Vec<ScoreRecord>, EngineError> {
    check_order(bars)?;
    let group = |wanted: IndicatorGroup| {
        indicators
            .values()
            .filter(|r| r.group == wanted)
            .map(|r| (r.key.as_str(), r.positions.as_slice()))
            .collect::<Vec<Signal<'_>>>()
    };
    let base = group(IndicatorGroup::Base);
    let power = group(IndicatorGroup::Power);
    let strategy_signals: Vec<Signal<'_>> = strategies
        .values()
        .map(|r| (r.key.as_str(), r.positions.as_slice()))
        .collect();

    score::score_bars(bars, &base, &power, &strategy_signals, config)
}

/// Indicators, strategies and scores for one instrument.
pub fn compute_instrument(
    symbol: &str,
    bars: &[Bar],
    indicators: &IndicatorRegistry,
    strategies: &StrategyRegistry,
    options: &EngineOptions,
) -> Result<InstrumentReport, EngineError> {
    let (indicator_results, strategy_results) = if options.parallel {
        rayon::join(
            || compute_indicators(bars, indicators, options),
            || compute_strategies(bars, strategies, options),
        )
    } else {
        (
            compute_indicators(bars, indicators, options),
            compute_strategies(bars, strategies, options),
        )
    };
    let indicator_results = indicator_results?;
    let strategy_results = strategy_results?;
    let scores = compute_score(bars, &indicator_results, &strategy_results, &options.score)?;

    if let Some(last) = scores.last() {
        info!(
            symbol,
            bars = bars.len(),
            date = %last.time_key,
            score = last.score,
            "instrument scored"
        );
    }

    Ok(InstrumentReport {
        symbol: symbol.to_string(),
        indicators: indicator_results,
        strategies: strategy_results,
        scores,
    })
}

/// [`compute_instrument`] for many instruments. One instrument failing does
/// not affect the others; results keep the input order.
pub fn compute_instruments(
    instruments: &[(String, Vec<Bar>)],
    indicators: &IndicatorRegistry,
    strategies: &StrategyRegistry,
    options: &EngineOptions,
) -> Vec<(String, Result<InstrumentReport, EngineError>)> {
    let run = |(symbol, bars): &(String, Vec<Bar>)| {
        (
            symbol.clone(),
            compute_instrument(symbol, bars, indicators, strategies, options),
        )
    };
    if options.parallel {
        instruments.par_iter().map(run).collect()
    } else {
        instruments.iter().map(run).collect()
    }
}
