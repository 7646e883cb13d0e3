//! Backtest simulator.
//!
//! Replays one strategy's position series against its bars. A signal change
//! observed on bar `i` is executed at the open of bar `i + 1`; a change on
//! the last bar is never executed. Unit size is
//! `floor(capital / open)` and entries at a non-positive open are skipped.
//! Closing happens on any change away from the held side, including a change
//! to flat. Whatever is still open at the end is valued at the last close and
//! reported as an [`OpenPosition`], not as a trade.

use std::fmt;

use chrono::NaiveDate;

use crate::domain::error::EngineError;
use crate::domain::metrics::TradeStats;
use crate::domain::ohlcv::Bar;
use crate::domain::position::{trailing_run, Position, PositionSeries};

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    /// Notional capital used to size every entry.
    pub capital: f64,
    /// When false, short signals only close longs.
    pub allow_shorting: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            capital: 100_000.0,
            allow_shorting: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    fn for_position(position: Position) -> Option<Side> {
        match position {
            Position::Long => Some(Side::Long),
            Position::Short => Some(Side::Short),
            Position::Flat => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

/// A closed round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub side: Side,
    pub entry_time: NaiveDate,
    pub exit_time: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub unit_size: i64,
    /// Bars from entry to exit, both inclusive.
    pub holding_days: usize,
    /// Positive when the trade made money, for either side.
    pub profit: f64,
    pub profit_percent: f64,
}

/// Position still held after the last bar.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub side: Side,
    pub entry_time: NaiveDate,
    pub entry_price: f64,
    pub unit_size: i64,
    pub holding_days: usize,
    /// Unrealized profit at the last close.
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyResult {
    pub key: String,
    pub positions: PositionSeries,
    pub trades: Vec<Trade>,
    pub stats: TradeStats,
    /// Profit of buying at the first executed entry and holding to the last close.
    pub hold_return: f64,
    pub hold_return_percent: f64,
    pub open_position: Option<OpenPosition>,
    /// Signal at the last bar.
    pub status: Position,
    /// Number of trailing bars holding `status`.
    pub days: usize,
}

impl StrategyResult {
    /// Unrealized profit of the open position, 0 when flat.
    pub fn open_profit(&self) -> f64 {
        self.open_position.as_ref().map_or(0.0, |p| p.profit)
    }
}

struct Holding {
    side: Side,
    entry_index: usize,
    entry_price: f64,
    units: i64,
}

impl Holding {
    fn profit_at(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.units as f64 * self.side.sign()
    }
}

fn unit_size(capital: f64, price: f64) -> i64 {
    if price > 0.0 {
        (capital / price).floor() as i64
    } else {
        0
    }
}

/// Replay `positions` over `bars`.
///
/// Returns [`EngineError::PositionLengthMismatch`] before simulating anything
/// when the series is not index-aligned with the bars.
pub fn simulate(
    key: &str,
    positions: &[Position],
    bars: &[Bar],
    config: &BacktestConfig,
) -> Result<StrategyResult, EngineError> {
    if positions.len() != bars.len() {
        return Err(EngineError::PositionLengthMismatch {
            key: key.to_string(),
            expected: bars.len(),
            actual: positions.len(),
        });
    }

    let mut trades = Vec::new();
    let mut holding: Option<Holding> = None;
    let mut first_entry: Option<f64> = None;
    let mut signal = Position::Flat;
    let mut pending: Option<Position> = None;

    for (i, bar) in bars.iter().enumerate() {
        if let Some(target) = pending.take() {
            let open = bar.open;
            let target_side = Side::for_position(target);

            if let Some(h) = holding.take_if(|h| Some(h.side) != target_side) {
                let entry = &bars[h.entry_index];
                let moved = (open - h.entry_price) * h.side.sign();
                trades.push(Trade {
                    side: h.side,
                    entry_time: entry.time_key,
                    exit_time: bar.time_key,
                    entry_price: h.entry_price,
                    exit_price: open,
                    unit_size: h.units,
                    holding_days: i - h.entry_index + 1,
                    profit: h.profit_at(open),
                    profit_percent: moved / h.entry_price.abs() * 100.0,
                });
            }

            let entry_side = target_side
                .filter(|&side| side == Side::Long || config.allow_shorting)
                .filter(|_| holding.is_none());
            let units = unit_size(config.capital, open);
            if let Some(side) = entry_side.filter(|_| units > 0) {
                first_entry.get_or_insert(open);
                holding = Some(Holding {
                    side,
                    entry_index: i,
                    entry_price: open,
                    units,
                });
            }
        }

        if positions[i] != signal {
            signal = positions[i];
            pending = Some(signal);
        }
    }

    let last_close = bars.last().map_or(0.0, |b| b.close);
    let open_position = holding.map(|h| OpenPosition {
        side: h.side,
        entry_time: bars[h.entry_index].time_key,
        entry_price: h.entry_price,
        unit_size: h.units,
        holding_days: bars.len() - h.entry_index,
        profit: h.profit_at(last_close),
    });

    let hold_return = first_entry.map_or(0.0, |price| {
        (last_close - price) * unit_size(config.capital, price) as f64
    });
    let hold_return_percent = if config.capital > 0.0 {
        hold_return / config.capital * 100.0
    } else {
        0.0
    };

    Ok(StrategyResult {
        key: key.to_string(),
        positions: positions.to_vec(),
        stats: TradeStats::compute(&trades, config.capital),
        trades,
        hold_return,
        hold_return_percent,
        open_position,
        status: positions.last().copied().unwrap_or_default(),
        days: trailing_run(positions),
    })
}
