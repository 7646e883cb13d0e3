//! Daily OHLCV bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub time_key: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub turnover: f64,
    pub turnover_rate: f64,
}

impl Bar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Closing prices of `bars`, index-aligned.
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

pub fn highs(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.high).collect()
}

pub fn lows(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.low).collect()
}

pub fn volumes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.volume).collect()
}

/// Index of the first bar whose time_key does not strictly exceed its
/// predecessor's, if any.
pub fn first_unordered(bars: &[Bar]) -> Option<usize> {
    bars.windows(2)
        .position(|w| w[1].time_key <= w[0].time_key)
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> Bar {
        Bar {
            time_key: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000.0,
            turnover: 5_000_000.0,
            turnover_rate: 0.4,
        }
    }

    #[test]
    fn typical_price() {
        let bar = sample_bar();
        let expected = (110.0 + 90.0 + 105.0) / 3.0;
        assert!((bar.typical_price() - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_hl_dominates() {
        let bar = sample_bar();
        assert!((bar.true_range(100.0) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bar = sample_bar();
        // |110-70| = 40 beats high-low = 20
        assert!((bar.true_range(70.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        let bar = sample_bar();
        assert!((bar.true_range(130.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn first_unordered_detects_duplicates_and_reversals() {
        let mut a = sample_bar();
        let mut b = sample_bar();
        let mut c = sample_bar();
        a.time_key = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        b.time_key = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        c.time_key = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

        assert_eq!(first_unordered(&[a.clone(), b.clone()]), None);
        assert_eq!(first_unordered(&[a.clone(), b.clone(), c]), Some(2));
        assert_eq!(first_unordered(&[b, a]), Some(1));
        assert_eq!(first_unordered(&[]), None);
    }
}
