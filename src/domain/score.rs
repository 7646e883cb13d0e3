//! Composite 0-100 score per bar.
//!
//! Indicator consensus sets the raw score; strategy consensus then damps or
//! shifts it:
//!
//! | strategies            | adjustment                                        |
//! |-----------------------|---------------------------------------------------|
//! | buy and sell present  | raw < low: `raw*damp + low`; raw > high: `raw*damp + high - 100*damp` |
//! | only buys             | `raw*boost + 100*(1 - boost)`                      |
//! | only sells            | `raw*boost`                                        |
//! | none                  | raw                                               |
//!
//! With the defaults (30, 70, 0.7, 0.3) these are `raw*0.7 + 30`, `raw*0.7`,
//! `raw*0.3 + 70` and `raw*0.3`.

use chrono::NaiveDate;

use crate::domain::error::EngineError;
use crate::domain::ohlcv::Bar;
use crate::domain::position::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreConfig {
    pub low_threshold: f64,
    pub high_threshold: f64,
    pub damp_weight: f64,
    pub boost_weight: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        ScoreConfig {
            low_threshold: 30.0,
            high_threshold: 70.0,
            damp_weight: 0.7,
            boost_weight: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub time_key: NaiveDate,
    pub ma_buy: usize,
    pub ma_sell: usize,
    pub in_buy: usize,
    pub in_sell: usize,
    pub strategy_buy: usize,
    pub strategy_sell: usize,
    pub ma_score: f64,
    pub in_score: f64,
    pub strategy_score: f64,
    pub score: f64,
}

/// A labelled position series entering the score.
pub type Signal<'a> = (&'a str, &'a [Position]);

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    buy: usize,
    sell: usize,
}

impl Tally {
    fn at(signals: &[Signal<'_>], i: usize) -> Self {
        signals.iter().fold(Tally::default(), |mut t, (_, positions)| {
            match positions[i] {
                Position::Long => t.buy += 1,
                Position::Short => t.sell += 1,
                Position::Flat => {}
            }
            t
        })
    }

    /// Net consensus in [-1, 1]; 0 for an empty group.
    fn net(self, group_size: usize) -> f64 {
        if group_size == 0 {
            0.0
        } else {
            (self.buy as f64 - self.sell as f64) / group_size as f64
        }
    }
}

fn percentile(net: f64) -> f64 {
    net * 50.0 + 50.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Apply strategy consensus to the indicator-only `raw` score.
pub fn blend(raw: f64, strategy_buy: usize, strategy_sell: usize, config: &ScoreConfig) -> f64 {
    let adjusted = match (strategy_buy > 0, strategy_sell > 0) {
        (true, true) if raw < config.low_threshold => raw * config.damp_weight + config.low_threshold,
        (true, true) if raw > config.high_threshold => {
            raw * config.damp_weight + config.high_threshold - 100.0 * config.damp_weight
        }
        (true, false) => raw * config.boost_weight + 100.0 * (1.0 - config.boost_weight),
        (false, true) => raw * config.boost_weight,
        _ => raw,
    };
    round2(adjusted).clamp(0.0, 100.0)
}

fn check_aligned(signals: &[Signal<'_>], bar_count: usize) -> Result<(), EngineError> {
    for (key, positions) in signals {
        if positions.len() != bar_count {
            return Err(EngineError::PositionLengthMismatch {
                key: key.to_string(),
                expected: bar_count,
                actual: positions.len(),
            });
        }
    }
    Ok(())
}

/// One record per bar from BASE indicators, POWER indicators and strategies.
pub fn score_bars(
    bars: &[Bar],
    base: &[Signal<'_>],
    power: &[Signal<'_>],
    strategies: &[Signal<'_>],
    config: &ScoreConfig,
) -> Result<Vec<ScoreRecord>, EngineError> {
    for group in [base, power, strategies] {
        check_aligned(group, bars.len())?;
    }

    let records = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let ma = Tally::at(base, i);
            let ind = Tally::at(power, i);
            let strat = Tally::at(strategies, i);
            let ma_v = ma.net(base.len());
            let in_v = ind.net(power.len());
            let raw = percentile((ma_v + in_v) / 2.0);

            ScoreRecord {
                time_key: bar.time_key,
                ma_buy: ma.buy,
                ma_sell: ma.sell,
                in_buy: ind.buy,
                in_sell: ind.sell,
                strategy_buy: strat.buy,
                strategy_sell: strat.sell,
                ma_score: percentile(ma_v),
                in_score: percentile(in_v),
                strategy_score: percentile(strat.net(strategies.len())),
                score: blend(raw, strat.buy, strat.sell, config),
            }
        })
        .collect();
    Ok(records)
}
