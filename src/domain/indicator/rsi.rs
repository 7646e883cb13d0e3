//! Relative Strength Index with zoned positions.
//!
//! RSI = MA(max(ΔC, 0), n, 1) / MA(|ΔC|, n, 1) * 100, or 100 when there was
//! no movement. Zones: above 80 short, 50..80 long, 20..50 short, below 20 long.

use crate::domain::indicator::{Indicator, IndicatorGroup, IndicatorOutput};
use crate::domain::ohlcv::Bar;
use crate::domain::position::Position;
use crate::domain::series;

#[derive(Debug, Clone)]
pub struct Rsi {
    pub period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Rsi { period: 14 }
    }
}

impl Rsi {
    pub fn values(&self, bars: &[Bar]) -> Vec<f64> {
        let mut up = Vec::with_capacity(bars.len());
        let mut moved = Vec::with_capacity(bars.len());
        for (i, bar) in bars.iter().enumerate() {
            if i == 0 {
                up.push(0.0);
                moved.push(0.0);
                continue;
            }
            let change = bar.close - bars[i - 1].close;
            up.push(change.max(0.0));
            moved.push(change.abs());
        }

        let up_ma = series::ma(&up, self.period, 1.0);
        let moved_ma = series::ma(&moved, self.period, 1.0);
        (0..bars.len())
            .map(|i| {
                if i == 0 {
                    0.0
                } else if moved_ma[i] > 0.0 {
                    up_ma[i] / moved_ma[i] * 100.0
                } else {
                    100.0
                }
            })
            .collect()
    }
}

fn zone(rsi: f64) -> Position {
    if rsi > 80.0 {
        Position::Short
    } else if rsi > 50.0 {
        Position::Long
    } else if rsi > 20.0 {
        Position::Short
    } else {
        Position::Long
    }
}

impl Indicator for Rsi {
    fn key(&self) -> String {
        "RSI_indicator".to_string()
    }

    fn group(&self) -> IndicatorGroup {
        IndicatorGroup::Power
    }

    fn calculate(&self, bars: &[Bar]) -> IndicatorOutput {
        let values = self.values(bars);
        let positions = values
            .iter()
            .enumerate()
            .map(|(i, &v)| if i == 0 { Position::Flat } else { zone(v) })
            .collect();
        IndicatorOutput {
            positions,
            score: values.last().copied().unwrap_or(0.0),
        }
    }
}
