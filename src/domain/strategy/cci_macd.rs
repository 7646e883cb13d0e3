//! CCI/MACD agreement (`CCI_MACD_strategy`).
//!
//! TED = EMA(CCI(p1) + CCI(p2), cci_m). Goes long when TED and the MACD
//! histogram both rose on the bar and the CCI sum rose strictly over each of
//! the last `day_wait` steps; short on the mirrored condition.

use crate::domain::error::EngineError;
use crate::domain::indicator::macd::Macd;
use crate::domain::ohlcv::{self, Bar};
use crate::domain::position::{Position, PositionSeries};
use crate::domain::series;
use crate::domain::strategy::{
    count_param, period_param, unknown_param, Strategy, StrategyParams,
};

#[derive(Debug, Clone)]
pub struct CciMacd {
    pub cci_p1: usize,
    pub cci_p2: usize,
    pub cci_m: usize,
    pub macd_short: usize,
    pub macd_long: usize,
    pub macd_m: usize,
    pub day_wait: usize,
}

impl Default for CciMacd {
    fn default() -> Self {
        CciMacd {
            cci_p1: 13,
            cci_p2: 34,
            cci_m: 9,
            macd_short: 13,
            macd_long: 34,
            macd_m: 9,
            day_wait: 2,
        }
    }
}

/// Every step in `data[day - length..=day]` strictly increases.
fn rising(data: &[f64], day: usize, length: usize) -> bool {
    day >= length && (day - length..day).all(|j| data[j + 1] > data[j])
}

fn falling(data: &[f64], day: usize, length: usize) -> bool {
    day >= length && (day - length..day).all(|j| data[j + 1] < data[j])
}

impl Strategy for CciMacd {
    fn key(&self) -> String {
        "CCI_MACD_strategy".into()
    }

    fn params(&self) -> StrategyParams {
        StrategyParams::from([
            ("cci_p1".to_string(), self.cci_p1 as f64),
            ("cci_p2".to_string(), self.cci_p2 as f64),
            ("cci_m".to_string(), self.cci_m as f64),
            ("macd_short".to_string(), self.macd_short as f64),
            ("macd_long".to_string(), self.macd_long as f64),
            ("macd_m".to_string(), self.macd_m as f64),
            ("day_wait".to_string(), self.day_wait as f64),
        ])
    }

    fn set_params(&mut self, params: &StrategyParams) -> Result<(), EngineError> {
        let key = self.key();
        for (name, &value) in params {
            let slot = match name.as_str() {
                "cci_p1" => &mut self.cci_p1,
                "cci_p2" => &mut self.cci_p2,
                "cci_m" => &mut self.cci_m,
                "macd_short" => &mut self.macd_short,
                "macd_long" => &mut self.macd_long,
                "macd_m" => &mut self.macd_m,
                "day_wait" => {
                    self.day_wait = count_param(&key, name, value)?;
                    continue;
                }
                _ => return Err(unknown_param(&key, name)),
            };
            *slot = period_param(&key, name, value)?;
        }
        Ok(())
    }

    fn calculate(&self, bars: &[Bar]) -> PositionSeries {
        let cci_1 = series::cci(bars, self.cci_p1);
        let cci_2 = series::cci(bars, self.cci_p2);
        let cci_sum: Vec<f64> = cci_1.iter().zip(&cci_2).map(|(a, b)| a + b).collect();
        let ted = series::ema(&cci_sum, self.cci_m);
        let hist = Macd::new(self.macd_short, self.macd_long, self.macd_m)
            .histogram(&ohlcv::closes(bars));

        // bar 0 has no previous reading to compare against
        let warmup = self.day_wait.max(1);
        let mut status = Position::Flat;
        let mut positions = Vec::with_capacity(bars.len());
        for i in 0..bars.len() {
            if i < warmup {
                positions.push(Position::Flat);
                continue;
            }
            let up = ted[i] > ted[i - 1] && hist[i] > hist[i - 1];
            let down = ted[i] < ted[i - 1] && hist[i] < hist[i - 1];

            if up && rising(&cci_sum, i, self.day_wait) {
                status = Position::Long;
            }
            if down && falling(&cci_sum, i, self.day_wait) {
                status = Position::Short;
            }
            positions.push(status);
        }
        positions
    }
}
