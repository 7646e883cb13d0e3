//! Williams %R.

use crate::domain::indicator::{Indicator, IndicatorGroup, IndicatorOutput};
use crate::domain::ohlcv::{self, Bar};
use crate::domain::position::Position;
use crate::domain::series;

#[derive(Debug, Clone)]
pub struct WilliamsR {
    pub period: usize,
}

impl WilliamsR {
    pub fn new(period: usize) -> Self {
        WilliamsR { period }
    }

    /// %R in [-100, 0]; -100 when the window has no range.
    pub fn values(&self, bars: &[Bar]) -> Vec<f64> {
        let lowest = series::lowest(&ohlcv::lows(bars), self.period);
        let highest = series::highest(&ohlcv::highs(bars), self.period);
        bars.iter()
            .enumerate()
            .map(|(i, bar)| {
                let range = highest[i] - lowest[i];
                if range > 0.0 {
                    -100.0 * (highest[i] - bar.close) / range
                } else {
                    -100.0
                }
            })
            .collect()
    }
}

impl Indicator for WilliamsR {
    fn key(&self) -> String {
        format!("WMSR{}_indicator", self.period)
    }

    fn group(&self) -> IndicatorGroup {
        IndicatorGroup::Power
    }

    fn calculate(&self, bars: &[Bar]) -> IndicatorOutput {
        let values = self.values(bars);
        IndicatorOutput {
            positions: values.iter().map(|&wr| Position::from_sign(wr + 50.0)).collect(),
            score: values.last().copied().unwrap_or(0.0),
        }
    }
}
