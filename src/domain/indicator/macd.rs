//! MACD histogram sign.
//!
//! DIF = EMA(C, fast) - EMA(C, slow), DEA = EMA(DIF, signal),
//! MACD = 2 * (DIF - DEA); position = sign(MACD).

use crate::domain::indicator::{Indicator, IndicatorGroup, IndicatorOutput};
use crate::domain::ohlcv::{self, Bar};
use crate::domain::position::Position;
use crate::domain::series;

#[derive(Debug, Clone)]
pub struct Macd {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Macd { fast, slow, signal }
    }

    /// Histogram values, index-aligned with `closes`.
    pub fn histogram(&self, closes: &[f64]) -> Vec<f64> {
        let fast = series::ema(closes, self.fast);
        let slow = series::ema(closes, self.slow);
        let dif: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let dea = series::ema(&dif, self.signal);
        dif.iter().zip(&dea).map(|(d, e)| (d - e) * 2.0).collect()
    }
}

impl Indicator for Macd {
    fn key(&self) -> String {
        format!("MACD({},{})_indicator", self.fast, self.slow)
    }

    fn group(&self) -> IndicatorGroup {
        IndicatorGroup::Power
    }

    fn calculate(&self, bars: &[Bar]) -> IndicatorOutput {
        let hist = self.histogram(&ohlcv::closes(bars));
        IndicatorOutput {
            positions: hist.iter().map(|&h| Position::from_sign(h)).collect(),
            score: hist.last().copied().unwrap_or(0.0),
        }
    }
}
