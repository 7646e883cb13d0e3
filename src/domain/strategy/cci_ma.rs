//! Multi-timeframe CCI consensus (`CCI_MA_strategy`).
//!
//! Per bar a blended condition value is built from the longest CCI whose
//! previous two readings were non-negative, falling back to the short CCI
//! minus 100. Long needs the condition to have stayed >= 0 for `day_wait`
//! bars, the close to be at or above its value `cci_s_len` bars ago, the long
//! HMA not to have dropped more than 3% over `cci_l_len` bars, and a volume
//! expansion. Short needs the condition to have stayed <= -100 with the close
//! below its lagged value.

use crate::domain::error::EngineError;
use crate::domain::ohlcv::{self, Bar};
use crate::domain::position::{Position, PositionSeries};
use crate::domain::series::{self, keep_down_trend, keep_up_trend};
use crate::domain::strategy::{
    count_param, period_param, positive_param, unknown_param, Strategy, StrategyParams,
};

/// Largest tolerated relative drop of the long HMA.
const MAX_HMA_DRAWDOWN: f64 = -0.03;

#[derive(Debug, Clone)]
pub struct CciMa {
    pub cci_s_len: usize,
    pub cci_m_len: usize,
    pub cci_l_len: usize,
    pub day_wait: usize,
    pub vol_ma: usize,
    pub vol_ratio: f64,
}

impl Default for CciMa {
    fn default() -> Self {
        CciMa {
            cci_s_len: 13,
            cci_m_len: 21,
            cci_l_len: 34,
            day_wait: 2,
            vol_ma: 20,
            vol_ratio: 1.2,
        }
    }
}

impl CciMa {
    /// Blended CCI condition series.
    pub fn condition(&self, bars: &[Bar]) -> Vec<f64> {
        let cci_s = series::cci(bars, self.cci_s_len);
        let cci_m = series::cci(bars, self.cci_m_len);
        let cci_l = series::cci(bars, self.cci_l_len);
        (0..bars.len())
            .map(|i| {
                if keep_up_trend(&cci_l, 0.0, i, 2) {
                    cci_l[i]
                } else if keep_up_trend(&cci_m, 0.0, i, 2) {
                    cci_m[i]
                } else if keep_up_trend(&cci_s, 0.0, i, 2) {
                    cci_s[i]
                } else {
                    cci_s[i] - 100.0
                }
            })
            .collect()
    }

    fn trend_intact(&self, hma: &[f64], i: usize) -> bool {
        if hma[i] <= 0.0 {
            return true;
        }
        let base = if i > self.cci_l_len {
            hma[i - self.cci_l_len]
        } else {
            hma[0]
        };
        (hma[i] - base) / hma[i] > MAX_HMA_DRAWDOWN
    }
}

impl Strategy for CciMa {
    fn key(&self) -> String {
        "CCI_MA_strategy".into()
    }

    fn params(&self) -> StrategyParams {
        StrategyParams::from([
            ("cci_s_len".to_string(), self.cci_s_len as f64),
            ("cci_m_len".to_string(), self.cci_m_len as f64),
            ("cci_l_len".to_string(), self.cci_l_len as f64),
            ("day_wait".to_string(), self.day_wait as f64),
            ("vol_ma".to_string(), self.vol_ma as f64),
            ("vol_ratio".to_string(), self.vol_ratio),
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
                "vol_ma" => self.vol_ma = period_param(&key, name, value)?,
                "vol_ratio" => self.vol_ratio = positive_param(&key, name, value)?,
                _ => return Err(unknown_param(&key, name)),
            }
        }
        Ok(())
    }

    fn calculate(&self, bars: &[Bar]) -> PositionSeries {
        let closes = ohlcv::closes(bars);
        let volumes = ohlcv::volumes(bars);
        let condition = self.condition(bars);
        let hma = series::hma(&closes, self.cci_l_len);
        let vol_avg = series::sma(&volumes, self.vol_ma);

        let mut status = Position::Flat;
        let mut positions = Vec::with_capacity(bars.len());
        for i in 0..bars.len() {
            if i < self.cci_s_len {
                positions.push(Position::Flat);
                continue;
            }
            let lagged = closes[i - self.cci_s_len];
            let buy = keep_up_trend(&condition, 0.0, i, self.day_wait);
            let sell = keep_down_trend(&condition, -100.0, i, self.day_wait);
            let volume_confirmed =
                volumes[i] > vol_avg[i] * self.vol_ratio && volumes[i] > volumes[i - 1];

            if buy && closes[i] >= lagged && self.trend_intact(&hma, i) && volume_confirmed {
                status = Position::Long;
            }
            if sell && closes[i] < lagged {
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
    use crate::domain::strategy::test_support::{make_bars, params, zigzag};

    fn rally_with_volume_spike() -> Vec<Bar> {
        let mut prices = vec![100.0; 20];
        prices.extend((1..=20).map(|i| 100.0 + i as f64 * 1.5));
        let mut bars = make_bars(&prices);
        for (i, bar) in bars.iter_mut().enumerate().skip(20) {
            bar.volume = 1000.0 + (i as f64 - 19.0) * 400.0;
        }
        bars
    }

    #[test]
    fn warmup_is_flat() {
        let positions = CciMa::default().calculate(&make_bars(&zigzag(80)));
        assert_eq!(positions.len(), 80);
        assert!(positions[..13].iter().all(|&p| p == Position::Flat));
    }

    #[test]
    fn constant_price_stays_flat() {
        let positions = CciMa::default().calculate(&make_bars(&[10.0; 50]));
        assert!(positions.iter().all(|&p| p == Position::Flat));
    }

    #[test]
    fn rally_on_rising_volume_goes_long() {
        let bars = rally_with_volume_spike();
        let positions = CciMa::default().calculate(&bars);
        assert_eq!(*positions.last().unwrap(), Position::Long);
    }

    #[test]
    fn rally_without_volume_stays_flat() {
        let mut bars = rally_with_volume_spike();
        for bar in &mut bars {
            bar.volume = 1000.0;
        }
        let positions = CciMa::default().calculate(&bars);
        assert!(positions.iter().all(|&p| p == Position::Flat));
    }

    #[test]
    fn condition_falls_back_to_shifted_short_cci() {
        // cci is 0 while flat, so the long cci is taken
        let mut prices = vec![10.0; 5];
        assert!(CciMa::default()
            .condition(&make_bars(&prices))
            .iter()
            .all(|&c| c == 0.0));

        // after a slide every cci is negative: short cci - 100
        prices.extend([9.0, 8.0, 7.0, 6.0]);
        let bars = make_bars(&prices);
        let s = CciMa::default();
        let cond = s.condition(&bars);
        let cci_s = series::cci(&bars, s.cci_s_len);
        assert!((cond[8] - (cci_s[8] - 100.0)).abs() < 1e-9);
    }

    #[test]
    fn vol_ratio_must_be_positive() {
        let mut s = CciMa::default();
        assert!(s.set_params(&params(&[("vol_ratio", -1.0)])).is_err());
        s.set_params(&params(&[("vol_ratio", 1.5)])).unwrap();
        assert!((s.vol_ratio - 1.5).abs() < f64::EPSILON);
    }
}
