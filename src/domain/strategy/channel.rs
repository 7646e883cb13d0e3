//! Adaptive stop-channel strategies.
//!
//! Both strategies feed [`channel_positions`] with the close as the traded
//! price, a reference line, and a volatility band around it:
//!
//! - `ART_DL_strategy`: reference = close, band = RATR(day_count) * multi
//! - `BOLL_DL_strategy`: reference = SMA(close, day_count), band = STDDEV * multi

use crate::domain::error::EngineError;
use crate::domain::ohlcv::{self, Bar};
use crate::domain::position::{Position, PositionSeries};
use crate::domain::series;
use crate::domain::strategy::{
    period_param, positive_param, unknown_param, Strategy, StrategyParams,
};

/// Trailing stop line and the positions it produces.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub stops: Vec<f64>,
    pub positions: PositionSeries,
}

/// Walk the adaptive stop over `price`.
///
/// The stop sits at `reference - band` while price is above the previous
/// stop and at `reference + band` while below. While price stays on one side
/// for two bars the stop only ratchets toward it (max below, min above).
/// Crossing the previous stop downward goes short, upward goes long;
/// otherwise the prior position carries. Bar 0 is flat.
pub fn channel_positions(price: &[f64], reference: &[f64], band: &[f64]) -> Channel {
    let n = price.len();
    let mut stops = Vec::with_capacity(n);
    let mut positions = Vec::with_capacity(n);

    for i in 0..n {
        let lower = reference[i] - band[i];
        let upper = reference[i] + band[i];
        if i == 0 {
            stops.push(lower);
            positions.push(Position::Flat);
            continue;
        }

        let p = price[i];
        let last_price = price[i - 1];
        let last_stop = stops[i - 1];

        let stop = if p > last_stop && last_price > last_stop {
            lower.max(last_stop)
        } else if p < last_stop && last_price < last_stop {
            upper.min(last_stop)
        } else if p > last_stop {
            lower
        } else {
            upper
        };
        stops.push(stop);

        let position = if last_price < last_stop && p > last_stop {
            Position::Long
        } else if last_price > last_stop && p < last_stop {
            Position::Short
        } else {
            positions[i - 1]
        };
        positions.push(position);
    }

    Channel { stops, positions }
}

fn channel_params(day_count: usize, multi: f64) -> StrategyParams {
    StrategyParams::from([
        ("day_count".to_string(), day_count as f64),
        ("multi".to_string(), multi),
    ])
}

fn set_channel_params(
    key: &str,
    params: &StrategyParams,
    day_count: &mut usize,
    multi: &mut f64,
) -> Result<(), EngineError> {
    for (name, &value) in params {
        match name.as_str() {
            "day_count" => *day_count = period_param(key, name, value)?,
            "multi" => *multi = positive_param(key, name, value)?,
            _ => return Err(unknown_param(key, name)),
        }
    }
    Ok(())
}

/// ATR channel around the close.
#[derive(Debug, Clone)]
pub struct ArtChannel {
    pub day_count: usize,
    pub multi: f64,
}

impl Default for ArtChannel {
    fn default() -> Self {
        ArtChannel {
            day_count: 21,
            multi: 6.3,
        }
    }
}

impl Strategy for ArtChannel {
    fn key(&self) -> String {
        "ART_DL_strategy".into()
    }

    fn params(&self) -> StrategyParams {
        channel_params(self.day_count, self.multi)
    }

    fn set_params(&mut self, params: &StrategyParams) -> Result<(), EngineError> {
        let key = self.key();
        set_channel_params(&key, params, &mut self.day_count, &mut self.multi)
    }

    fn calculate(&self, bars: &[Bar]) -> PositionSeries {
        let closes = ohlcv::closes(bars);
        let band: Vec<f64> = series::ratr(bars, self.day_count)
            .into_iter()
            .map(|atr| atr * self.multi)
            .collect();
        channel_positions(&closes, &closes, &band).positions
    }
}

/// Bollinger channel around the SMA.
#[derive(Debug, Clone)]
pub struct BollChannel {
    pub day_count: usize,
    pub multi: f64,
}

impl Default for BollChannel {
    fn default() -> Self {
        BollChannel {
            day_count: 21,
            multi: 2.0,
        }
    }
}

impl Strategy for BollChannel {
    fn key(&self) -> String {
        "BOLL_DL_strategy".into()
    }

    fn params(&self) -> StrategyParams {
        channel_params(self.day_count, self.multi)
    }

    fn set_params(&mut self, params: &StrategyParams) -> Result<(), EngineError> {
        let key = self.key();
        set_channel_params(&key, params, &mut self.day_count, &mut self.multi)
    }

    fn calculate(&self, bars: &[Bar]) -> PositionSeries {
        let closes = ohlcv::closes(bars);
        let mid = series::sma(&closes, self.day_count);
        let band: Vec<f64> = series::stddev(&closes, self.day_count)
            .into_iter()
            .map(|sd| sd * self.multi)
            .collect();
        channel_positions(&closes, &mid, &band).positions
    }
}
