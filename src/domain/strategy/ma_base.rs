//! EMA slope with lagged-close breakout (`MA_Base_strategy`).

use crate::domain::error::EngineError;
use crate::domain::ohlcv::{self, Bar};
use crate::domain::position::{Position, PositionSeries};
use crate::domain::series;
use crate::domain::strategy::{period_param, unknown_param, Strategy, StrategyParams};

/// Relative one-bar move of the long EMA still treated as level.
const SLOPE_TOLERANCE: f64 = 0.001;

#[derive(Debug, Clone)]
pub struct MaBase {
    /// Lag of the breakout reference close.
    pub p1: usize,
    /// Medium EMA window.
    pub p2: usize,
    /// Long EMA window.
    pub p3: usize,
}

impl Default for MaBase {
    fn default() -> Self {
        MaBase {
            p1: 13,
            p2: 21,
            p3: 55,
        }
    }
}

impl Strategy for MaBase {
    fn key(&self) -> String {
        "MA_Base_strategy".into()
    }

    fn params(&self) -> StrategyParams {
        StrategyParams::from([
            ("p1".to_string(), self.p1 as f64),
            ("p2".to_string(), self.p2 as f64),
            ("p3".to_string(), self.p3 as f64),
        ])
    }

    fn set_params(&mut self, params: &StrategyParams) -> Result<(), EngineError> {
        let key = self.key();
        for (name, &value) in params {
            match name.as_str() {
                "p1" => self.p1 = period_param(&key, name, value)?,
                "p2" => self.p2 = period_param(&key, name, value)?,
                "p3" => self.p3 = period_param(&key, name, value)?,
                _ => return Err(unknown_param(&key, name)),
            }
        }
        Ok(())
    }

    fn calculate(&self, bars: &[Bar]) -> PositionSeries {
        let closes = ohlcv::closes(bars);
        let ma_m = series::ema(&closes, self.p2);
        let ma_l = series::ema(&closes, self.p3);

        let mut status = Position::Flat;
        let mut positions = Vec::with_capacity(bars.len());
        for i in 0..bars.len() {
            if i < 2 {
                positions.push(Position::Flat);
                continue;
            }
            let close = closes[i];
            let slow_base = if i > self.p1 {
                closes[i - self.p1]
            } else {
                closes[0]
            };
            let slope = if ma_l[i] > 0.0 {
                (ma_l[i] - ma_l[i - 1]) / ma_l[i]
            } else {
                0.0
            };

            if slope > -SLOPE_TOLERANCE && ma_m[i - 1] < ma_m[i] && close > slow_base {
                status = Position::Long;
            }
            if slope < SLOPE_TOLERANCE && ma_m[i - 1] > ma_m[i] && close <= slow_base {
                status = Position::Short;
            }
            positions.push(status);
        }
        positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::test_support::{make_bars, params};

    #[test]
    fn flat_series_never_signals() {
        let positions = MaBase::default().calculate(&make_bars(&[100.0; 10]));
        assert_eq!(positions, vec![Position::Flat; 10]);
    }

    #[test]
    fn steady_rally_goes_long() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64 * 0.05).collect();
        let positions = MaBase::default().calculate(&make_bars(&prices));
        assert_eq!(positions[1], Position::Flat);
        assert_eq!(positions[2], Position::Long);
        assert_eq!(*positions.last().unwrap(), Position::Long);
    }

    #[test]
    fn slide_goes_short() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 - i as f64 * 0.05).collect();
        let positions = MaBase::default().calculate(&make_bars(&prices));
        assert_eq!(*positions.last().unwrap(), Position::Short);
    }

    #[test]
    fn params_exposed() {
        let mut s = MaBase::default();
        assert_eq!(s.params(), params(&[("p1", 13.0), ("p2", 21.0), ("p3", 55.0)]));
        s.set_params(&params(&[("p3", 89.0)])).unwrap();
        assert_eq!(s.p3, 89);
    }
}
