//! Simple Moving Average (SMA).
//!
//! Rolling mean over a trailing window. A window holding any NaN yields NaN.
//! Lookback: period - 1 (first valid value at index period-1).

use crate::domain::Candle;
use crate::series::Indicator;

use super::nan_series;

/// SMA of an arbitrary series.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = nan_series(n);

    if period == 0 || n < period {
        return result;
    }

    // Running sum of the finite values in the window plus a NaN count, so a
    // gap only poisons the windows that actually contain it.
    let mut sum = 0.0;
    let mut nans = 0usize;
    for i in 0..n {
        let entering = values[i];
        if entering.is_nan() {
            nans += 1;
        } else {
            sum += entering;
        }

        if i >= period {
            let leaving = values[i - period];
            if leaving.is_nan() {
                nans -= 1;
            } else {
                sum -= leaving;
            }
        }

        if i + 1 >= period && nans == 0 {
            result[i] = sum / period as f64;
        }
    }

    result
}

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        sma(&closes, self.period)
    }
}
