//! CCI level-cross indicator.
//!
//! Crossing up through -100, 0 or 100 latches long; crossing down through any
//! of them latches short; otherwise the previous position carries over.

use crate::domain::indicator::{Indicator, IndicatorGroup, IndicatorOutput};
use crate::domain::ohlcv::Bar;
use crate::domain::position::Position;
use crate::domain::series;

const LEVELS: [f64; 3] = [-100.0, 0.0, 100.0];

#[derive(Debug, Clone)]
pub struct CciCross {
    pub period: usize,
}

impl CciCross {
    pub fn new(period: usize) -> Self {
        CciCross { period }
    }
}

fn crossed_up(prev: f64, curr: f64) -> bool {
    LEVELS.iter().any(|&level| prev < level && curr >= level)
}

fn crossed_down(prev: f64, curr: f64) -> bool {
    LEVELS.iter().any(|&level| prev > level && curr <= level)
}

impl Indicator for CciCross {
    fn key(&self) -> String {
        format!("CCI{}_indicator", self.period)
    }

    fn group(&self) -> IndicatorGroup {
        IndicatorGroup::Power
    }

    fn calculate(&self, bars: &[Bar]) -> IndicatorOutput {
        if bars.is_empty() {
            return IndicatorOutput::empty();
        }
        let cci = series::cci(bars, self.period);
        let mut positions = Vec::with_capacity(bars.len());
        for i in 0..bars.len() {
            if i < 2 {
                positions.push(Position::Flat);
                continue;
            }
            let status = if crossed_up(cci[i - 1], cci[i]) {
                Position::Long
            } else if crossed_down(cci[i - 1], cci[i]) {
                Position::Short
            } else {
                positions[i - 1]
            };
            positions.push(status);
        }

        IndicatorOutput {
            positions,
            score: cci[cci.len() - 1],
        }
    }
}
