//! Bull/Bear Power.
//!
//! bull = (C - LOWEST(L, 50)) / RATR(5), bear = (HIGHEST(H, 50) - C) / RATR(5),
//! score = bull - bear, position = sign(score).

use crate::domain::indicator::{Indicator, IndicatorGroup, IndicatorOutput};
use crate::domain::ohlcv::{self, Bar};
use crate::domain::position::Position;
use crate::domain::series;

#[derive(Debug, Clone)]
pub struct BullBearPower {
    pub range_period: usize,
    pub atr_period: usize,
}

impl Default for BullBearPower {
    fn default() -> Self {
        BullBearPower {
            range_period: 50,
            atr_period: 5,
        }
    }
}

impl BullBearPower {
    /// Net power (bull minus bear) per bar; zero wherever the ATR is zero.
    pub fn power(&self, bars: &[Bar]) -> Vec<f64> {
        let atr = series::ratr(bars, self.atr_period);
        let lowest = series::lowest(&ohlcv::lows(bars), self.range_period);
        let highest = series::highest(&ohlcv::highs(bars), self.range_period);

        bars.iter()
            .enumerate()
            .map(|(i, bar)| {
                if atr[i] > 0.0 {
                    let bull = (bar.close - lowest[i]) / atr[i];
                    let bear = (highest[i] - bar.close) / atr[i];
                    bull - bear
                } else {
                    0.0
                }
            })
            .collect()
    }
}

impl Indicator for BullBearPower {
    // Storage key, spelled as persisted.
    fn key(&self) -> String {
        "BUll_BEAR_POWER_indicator".to_string()
    }

    fn group(&self) -> IndicatorGroup {
        IndicatorGroup::Power
    }

    fn calculate(&self, bars: &[Bar]) -> IndicatorOutput {
        let power = self.power(bars);
        IndicatorOutput {
            positions: power.iter().map(|&p| Position::from_sign(p)).collect(),
            score: power.last().copied().unwrap_or(0.0),
        }
    }
}
