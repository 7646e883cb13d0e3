//! CCI consensus gated by WMA crossovers (`CCI_WMA_strategy`).
//!
//! A crossover gate tracks the last WMA cross: medium crossing down through
//! long arms short, short crossing up through medium arms long. A buy needs
//! the gate long and, for the `day_wait` bars before, CCI(short) >= 100 with
//! CCI(medium) and CCI(long) >= -100. Sells mirror it.

use crate::domain::error::EngineError;
use crate::domain::ohlcv::{self, Bar};
use crate::domain::position::{Position, PositionSeries};
use crate::domain::series::{self, keep_down_trend, keep_up_trend};
use crate::domain::strategy::{
    count_param, period_param, unknown_param, Strategy, StrategyParams,
};

#[derive(Debug, Clone)]
pub struct CciWma {
    pub cci_s_len: usize,
    pub cci_m_len: usize,
    pub cci_l_len: usize,
    pub day_wait: usize,
}

impl Default for CciWma {
    fn default() -> Self {
        CciWma {
            cci_s_len: 13,
            cci_m_len: 21,
            cci_l_len: 34,
            day_wait: 2,
        }
    }
}

/// Latched crossover state per bar; the first two bars are flat.
pub fn crossover_gate(short: &[f64], medium: &[f64], long: &[f64]) -> PositionSeries {
    let mut gate = Vec::with_capacity(short.len());
    for i in 0..short.len() {
        if i < 2 {
            gate.push(Position::Flat);
            continue;
        }
        let state = if short[i - 2] < medium[i - 2] && short[i - 1] >= medium[i - 1] {
            Position::Long
        } else if medium[i - 2] > long[i - 2] && medium[i - 1] <= long[i - 1] {
            Position::Short
        } else {
            gate[i - 1]
        };
        gate.push(state);
    }
    gate
}

impl Strategy for CciWma {
    fn key(&self) -> String {
        "CCI_WMA_strategy".into()
    }

    fn params(&self) -> StrategyParams {
        StrategyParams::from([
            ("cci_s_len".to_string(), self.cci_s_len as f64),
            ("cci_m_len".to_string(), self.cci_m_len as f64),
            ("cci_l_len".to_string(), self.cci_l_len as f64),
            ("day_wait".to_string(), self.day_wait as f64),
        ])
    }

    fn set_params(&mut self, params: &StrategyParams) -> Result<(), EngineError> {
        let key = self.key();
        for (name, &value) in params {
            match name.as_str() {
                "cci_s_len" => self.cci_s_len = period_param(&key, name, value)?,
                "cci_m_len" => self.cci_m_len = period_param(&key, name, value)?,
                "cci_l_len" => self.cci_l_len = period_param(&key, name, value)?,
                "day_wait" => self.day_wait = count_param(&key, name, value)?,
                _ => return Err(unknown_param(&key, name)),
            }
        }
        Ok(())
    }

    fn calculate(&self, bars: &[Bar]) -> PositionSeries {
        let closes = ohlcv::closes(bars);
        let cci_s = series::cci(bars, self.cci_s_len);
        let cci_m = series::cci(bars, self.cci_m_len);
        let cci_l = series::cci(bars, self.cci_l_len);
        let gate = crossover_gate(
            &series::wma(&closes, self.cci_s_len),
            &series::wma(&closes, self.cci_m_len),
            &series::wma(&closes, self.cci_l_len),
        );

        let wait = self.day_wait;
        let mut status = Position::Flat;
        let mut positions = Vec::with_capacity(bars.len());
        for i in 0..bars.len() {
            let cci_long = keep_up_trend(&cci_s, 100.0, i, wait)
                && keep_up_trend(&cci_m, -100.0, i, wait)
                && keep_up_trend(&cci_l, -100.0, i, wait);
            let cci_short = keep_down_trend(&cci_s, -100.0, i, wait)
                && keep_down_trend(&cci_m, 100.0, i, wait)
                && keep_down_trend(&cci_l, 100.0, i, wait);

            if cci_long && gate[i] == Position::Long {
                status = Position::Long;
            }
            if cci_short && gate[i] == Position::Short {
                status = Position::Short;
            }
            positions.push(status);
        }
        positions
    }
}
