//! Windowed numeric primitives over index-aligned series.
//!
//! Every function returns a vector the same length as its input. Windowed
//! functions shrink the window over the first `period - 1` indices: at index
//! `i` the window holds `min(period, i + 1)` values. Moving averages start at
//! the literal first input value. Any division by zero yields 0.

use crate::domain::ohlcv::Bar;

/// Scaling constant of the Commodity Channel Index.
pub const CCI_FACTOR: f64 = 0.015;

/// Effective window length at index `i`. A zero period behaves as 1.
fn window(i: usize, period: usize) -> usize {
    period.max(1).min(i + 1)
}

/// Python-style `round(x)` used for derived window sizes (ties to even).
fn round_period(x: f64) -> usize {
    (x.round_ties_even().max(1.0)) as usize
}

fn guarded_div(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Rolling sum.
pub fn sum(data: &[f64], period: usize) -> Vec<f64> {
    (0..data.len())
        .map(|i| {
            let w = window(i, period);
            data[i + 1 - w..=i].iter().sum()
        })
        .collect()
}

/// Simple moving average.
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    (0..data.len())
        .map(|i| {
            let w = window(i, period);
            data[i + 1 - w..=i].iter().sum::<f64>() / w as f64
        })
        .collect()
}

/// Exponential moving average with smoothing 2 / (w + 1).
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    let mut result = Vec::with_capacity(data.len());
    for (i, &x) in data.iter().enumerate() {
        if i == 0 {
            result.push(x);
            continue;
        }
        let w = window(i, period) as f64;
        let prev = result[i - 1];
        result.push((2.0 * x + (w - 1.0) * prev) / (w + 1.0));
    }
    result
}

/// Linearly weighted moving average; the value at lag `j` has weight `w - j`.
pub fn wma(data: &[f64], period: usize) -> Vec<f64> {
    (0..data.len())
        .map(|i| {
            let w = window(i, period);
            let mut norm = 0.0;
            let mut acc = 0.0;
            for j in 0..w {
                let weight = (w - j) as f64;
                norm += weight;
                acc += data[i - j] * weight;
            }
            acc / norm
        })
        .collect()
}

/// Generic smoothing: `(weight * x + (w - weight) * prev) / w`.
///
/// With `weight = 1` this is the SMA-style recursive average used by KDJ and RSI.
pub fn ma(data: &[f64], period: usize, weight: f64) -> Vec<f64> {
    let mut result = Vec::with_capacity(data.len());
    for (i, &x) in data.iter().enumerate() {
        if i == 0 {
            result.push(x);
            continue;
        }
        let w = window(i, period) as f64;
        let prev = result[i - 1];
        result.push((weight * x + (w - weight) * prev) / w);
    }
    result
}

/// Hull moving average: WMA(2 * WMA(n/2) - WMA(n), sqrt(n)).
pub fn hma(data: &[f64], period: usize) -> Vec<f64> {
    let half = round_period(period as f64 / 2.0);
    let root = round_period((period as f64).sqrt());
    let half_wma = wma(data, half);
    let full_wma = wma(data, period);
    let raw: Vec<f64> = half_wma
        .iter()
        .zip(&full_wma)
        .map(|(h, f)| 2.0 * h - f)
        .collect();
    wma(&raw, root)
}

/// Wilder smoothing with a fixed decay of `1 / period`, seeded at 0.
pub fn rma(data: &[f64], period: usize) -> Vec<f64> {
    let alpha = period.max(1) as f64;
    let mut result = Vec::with_capacity(data.len());
    for (i, &x) in data.iter().enumerate() {
        if i == 0 {
            result.push(0.0);
            continue;
        }
        let prev = result[i - 1];
        result.push((x + (alpha - 1.0) * prev) / alpha);
    }
    result
}

/// Population standard deviation of each window around its own SMA.
pub fn stddev(data: &[f64], period: usize) -> Vec<f64> {
    deviation(data, period, |d| d * d).into_iter().map(f64::sqrt).collect()
}

/// Mean absolute deviation of each window around its own SMA.
pub fn avedev(data: &[f64], period: usize) -> Vec<f64> {
    deviation(data, period, f64::abs)
}

fn deviation(data: &[f64], period: usize, f: impl Fn(f64) -> f64) -> Vec<f64> {
    let mean = sma(data, period);
    (0..data.len())
        .map(|i| {
            if i == 0 {
                return 0.0;
            }
            let w = window(i, period);
            let total: f64 = data[i + 1 - w..=i].iter().map(|&x| f(x - mean[i])).sum();
            total / w as f64
        })
        .collect()
}

/// Rolling maximum.
pub fn highest(data: &[f64], period: usize) -> Vec<f64> {
    (0..data.len())
        .map(|i| {
            let w = window(i, period);
            data[i + 1 - w..=i]
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max)
        })
        .collect()
}

/// Rolling minimum.
pub fn lowest(data: &[f64], period: usize) -> Vec<f64> {
    (0..data.len())
        .map(|i| {
            let w = window(i, period);
            data[i + 1 - w..=i]
                .iter()
                .copied()
                .fold(f64::INFINITY, f64::min)
        })
        .collect()
}

/// True range per bar. The first bar has no predecessor and uses high - low.
pub fn tr(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

/// Wilder-smoothed average true range.
pub fn ratr(bars: &[Bar], period: usize) -> Vec<f64> {
    rma(&tr(bars), period)
}

/// Typical price per bar.
pub fn typ(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(Bar::typical_price).collect()
}

/// Commodity Channel Index. Zero where the mean deviation is zero.
pub fn cci(bars: &[Bar], period: usize) -> Vec<f64> {
    let typical = typ(bars);
    let mean = sma(&typical, period);
    let dev = avedev(&typical, period);
    (0..typical.len())
        .map(|i| {
            if i == 0 {
                0.0
            } else {
                guarded_div(typical[i] - mean[i], CCI_FACTOR * dev[i])
            }
        })
        .collect()
}

/// Volume-weighted moving average of closes.
pub fn vwma(bars: &[Bar], period: usize) -> Vec<f64> {
    let weighted: Vec<f64> = bars.iter().map(|b| b.close * b.volume).collect();
    let volume: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    let weighted_ma = sma(&weighted, period);
    let volume_ma = sma(&volume, period);
    weighted_ma
        .iter()
        .zip(&volume_ma)
        .map(|(&w, &v)| guarded_div(w, v))
        .collect()
}

/// True when every value in the `length` bars before `day` is `>= floor`.
/// The bar at `day` itself is not inspected.
pub fn keep_up_trend(data: &[f64], floor: f64, day: usize, length: usize) -> bool {
    let start = day.saturating_sub(length);
    data[start..day].iter().all(|&v| v >= floor)
}

/// True when every value in the `length` bars before `day` is `<= ceiling`.
pub fn keep_down_trend(data: &[f64], ceiling: f64, day: usize, length: usize) -> bool {
    let start = day.saturating_sub(length);
    data[start..day].iter().all(|&v| v <= ceiling)
}
