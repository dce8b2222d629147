//! Relative Strength Index (RSI).
//!
//! Wilder smoothing of average gains and losses:
//! seed at index `period` from the simple averages of the first `period`
//! deltas, then avg = (avg * (period - 1) + new) / period.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Lookback: period.
//!
//! A zero average loss is replaced by `RSI_LOSS_EPSILON`, so a pure uptrend
//! reads just under 100 and a flat series reads 0.

use crate::domain::Candle;
use crate::series::{settle_memory, Indicator};

use super::nan_series;

/// Floor substituted for a zero average loss.
pub const RSI_LOSS_EPSILON: f64 = 1e-4;

/// RSI of an arbitrary series.
///
/// A NaN in the seed deltas leaves the whole output NaN. After the seed a NaN
/// delta yields NaN at that index and leaves the averages untouched.
pub fn rsi(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = nan_series(n);

    if period == 0 || n < period + 1 {
        return result;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let delta = values[i] - values[i - 1];
        if delta.is_nan() {
            return result;
        }
        if delta >= 0.0 {
            avg_gain += delta;
        } else {
            avg_loss -= delta;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    result[period] = rsi_value(avg_gain, avg_loss);

    let p = period as f64;
    for i in (period + 1)..n {
        let delta = values[i] - values[i - 1];
        if delta.is_nan() {
            continue;
        }
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);
        avg_gain = (avg_gain * (p - 1.0) + gain) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss) / p;
        result[i] = rsi_value(avg_gain, avg_loss);
    }

    result
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    let denom = if avg_loss == 0.0 {
        RSI_LOSS_EPSILON
    } else {
        avg_loss
    };
    100.0 - 100.0 / (1.0 + avg_gain / denom)
}

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
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
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        rsi(&closes, self.period)
    }
}
