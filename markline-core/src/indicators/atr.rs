//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR seeds with the mean of the first `period` true ranges that have a
//! previous close, then applies Wilder smoothing:
//! atr = (prev * (period - 1) + tr) / period.
//! Lookback: period.

use crate::domain::Candle;
use crate::series::{settle_memory, Indicator};

use super::nan_series;

/// True Range per candle.
///
/// TR[0] = high[0] - low[0], since there is no previous close.
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    let mut tr = nan_series(candles.len());
    let Some(first) = candles.first() else {
        return tr;
    };
    tr[0] = first.high - first.low;

    for (i, pair) in candles.windows(2).enumerate() {
        let (prev, cur) = (&pair[0], &pair[1]);
        let pc = prev.close;
        tr[i + 1] = (cur.high - cur.low)
            .max((cur.high - pc).abs())
            .max((cur.low - pc).abs());
    }

    tr
}

/// Wilder smoothing (alpha = 1/period).
///
/// Seeds with the mean of the first contiguous `period` finite values, placed
/// at the last index of that run. A NaN after the seed yields NaN at that
/// index and the smoothing resumes from the last finite value.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = nan_series(n);
    if period == 0 || n < period {
        return result;
    }

    let mut run = 0usize;
    let mut seed_end = None;
    for (i, v) in values.iter().enumerate() {
        if v.is_nan() {
            run = 0;
            continue;
        }
        run += 1;
        if run == period {
            seed_end = Some(i);
            break;
        }
    }
    let Some(seed_end) = seed_end else {
        return result;
    };

    let p = period as f64;
    let mut prev = values[seed_end + 1 - period..=seed_end].iter().sum::<f64>() / p;
    result[seed_end] = prev;

    for i in (seed_end + 1)..n {
        let v = values[i];
        if v.is_nan() {
            continue;
        }
        prev = (prev * (p - 1.0) + v) / p;
        result[i] = prev;
    }

    result
}

/// ATR over candles. TR[0] is excluded from the seed.
pub fn atr(candles: &[Candle], period: usize) -> Vec<f64> {
    let mut tr = true_range(candles);
    if let Some(first) = tr.first_mut() {
        *first = f64::NAN;
    }
    wilder_smooth(&tr, period)
}

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn memory(&self) -> Option<usize> {
        Some(settle_memory(self.lookback(), self.period))
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        atr(candles, self.period)
    }
}
