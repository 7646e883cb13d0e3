//! Price-versus-moving-average indicators (SMA and EMA).
//!
//! Long while the close is above the average, short while below. The first
//! two bars are flat. The terminal score is the last average value.

use crate::domain::indicator::{Indicator, IndicatorGroup, IndicatorOutput};
use crate::domain::ohlcv::{self, Bar};
use crate::domain::position::Position;
use crate::domain::series;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AverageKind {
    Sma,
    Ema,
}

#[derive(Debug, Clone)]
pub struct PriceVsAverage {
    pub kind: AverageKind,
    pub period: usize,
}

impl PriceVsAverage {
    pub fn sma(period: usize) -> Self {
        PriceVsAverage {
            kind: AverageKind::Sma,
            period,
        }
    }

    pub fn ema(period: usize) -> Self {
        PriceVsAverage {
            kind: AverageKind::Ema,
            period,
        }
    }
}

impl Indicator for PriceVsAverage {
    fn key(&self) -> String {
        match self.kind {
            AverageKind::Sma => format!("SMA{}_indicator", self.period),
            AverageKind::Ema => format!("EMA{}_indicator", self.period),
        }
    }

    // EMA lines form the trend (BASE) bucket; SMA lines count as POWER.
    fn group(&self) -> IndicatorGroup {
        match self.kind {
            AverageKind::Sma => IndicatorGroup::Power,
            AverageKind::Ema => IndicatorGroup::Base,
        }
    }

    fn calculate(&self, bars: &[Bar]) -> IndicatorOutput {
        if bars.is_empty() {
            return IndicatorOutput::empty();
        }
        let closes = ohlcv::closes(bars);
        let average = match self.kind {
            AverageKind::Sma => series::sma(&closes, self.period),
            AverageKind::Ema => series::ema(&closes, self.period),
        };

        let positions = closes
            .iter()
            .zip(&average)
            .enumerate()
            .map(|(i, (&close, &avg))| {
                if i < 2 {
                    Position::Flat
                } else {
                    Position::from_sign(close - avg)
                }
            })
            .collect();

        IndicatorOutput {
            positions,
            score: average[average.len() - 1],
        }
    }
}
