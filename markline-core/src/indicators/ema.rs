//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = (x[t] - EMA[t-1]) * alpha + EMA[t-1], alpha = 2/(period+1).
//! Seed: SMA of the first contiguous run of `period` finite values, placed at
//! the last index of that run. On clean input that is index period-1.
//! After the seed a NaN input yields NaN at that index and the recursion
//! carries on from the last finite EMA.

use crate::domain::Candle;
use crate::series::{settle_memory, Indicator};

use super::nan_series;

/// EMA of an arbitrary series, tolerant of NaN gaps.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = nan_series(n);

    if period == 0 || n < period {
        return result;
    }

    // Seed at the end of the first full window without NaN.
    let mut run = 0usize;
    let mut seed_index = None;
    for (i, v) in values.iter().enumerate() {
        if v.is_nan() {
            run = 0;
            continue;
        }
        run += 1;
        if run == period {
            seed_index = Some(i);
            break;
        }
    }

    let Some(seed_index) = seed_index else {
        return result;
    };

    let seed: f64 = values[seed_index + 1 - period..=seed_index].iter().sum::<f64>() / period as f64;
    result[seed_index] = seed;

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = seed;
    for i in (seed_index + 1)..n {
        let v = values[i];
        if v.is_nan() {
            continue;
        }
        prev = (v - prev) * alpha + prev;
        result[i] = prev;
    }

    result
}

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn memory(&self) -> Option<usize> {
        Some(settle_memory(self.lookback(), self.period))
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        ema(&closes, self.period)
    }
}
