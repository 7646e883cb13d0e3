//! KDJ stochastic oscillator.
//!
//! RSV = (C - LOWEST(L, 9)) / (HIGHEST(H, 9) - LOWEST(L, 9)) * 100
//! K = MA(RSV, 3, 1), D = MA(K, 3, 1), J = 3K - 2D.
//! The first two bars are always flat.

use crate::domain::indicator::{Indicator, IndicatorGroup, IndicatorOutput};
use crate::domain::ohlcv::{self, Bar};
use crate::domain::position::Position;
use crate::domain::series;

#[derive(Debug, Clone)]
pub struct Kdj {
    pub rsv_period: usize,
    pub k_period: usize,
    pub d_period: usize,
}

impl Default for Kdj {
    fn default() -> Self {
        Kdj {
            rsv_period: 9,
            k_period: 3,
            d_period: 3,
        }
    }
}

/// K, D and J lines, index-aligned with the bars.
pub struct KdjLines {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
    pub j: Vec<f64>,
}

impl Kdj {
    pub fn lines(&self, bars: &[Bar]) -> KdjLines {
        let lowest = series::lowest(&ohlcv::lows(bars), self.rsv_period);
        let highest = series::highest(&ohlcv::highs(bars), self.rsv_period);

        let rsv: Vec<f64> = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let range = highest[i] - lowest[i];
                let raw = if range > 0.0 {
                    (bar.close - lowest[i]) / range
                } else {
                    0.0
                };
                raw * 100.0
            })
            .collect();

        let k = series::ma(&rsv, self.k_period, 1.0);
        let d = series::ma(&k, self.d_period, 1.0);
        let j = k.iter().zip(&d).map(|(k, d)| 3.0 * k - 2.0 * d).collect();
        KdjLines { k, d, j }
    }
}

fn classify(k: f64, d: f64, j: f64) -> Position {
    if j > 100.0 && k > 90.0 && d > 80.0 {
        Position::Short
    } else if j < 0.0 && k < 10.0 && d < 20.0 {
        Position::Long
    } else if j > k {
        Position::Long
    } else if j < k {
        Position::Short
    } else {
        Position::Flat
    }
}

impl Indicator for Kdj {
    fn key(&self) -> String {
        "KDJ_indicator".to_string()
    }

    fn group(&self) -> IndicatorGroup {
        IndicatorGroup::Power
    }

    fn calculate(&self, bars: &[Bar]) -> IndicatorOutput {
        if bars.is_empty() {
            return IndicatorOutput::empty();
        }
        let lines = self.lines(bars);
        let positions = (0..bars.len())
            .map(|i| {
                if i < 2 {
                    Position::Flat
                } else {
                    classify(lines.k[i], lines.d[i], lines.j[i])
                }
            })
            .collect();

        IndicatorOutput {
            positions,
            score: lines.j[bars.len() - 1],
        }
    }
}
