//! Gaussian-smoothed moving average (SGMA).
//!
//! A trailing window of `period` closes weighted by a normalized Gaussian
//! centered on the window, sigma = period / 2. The kernel is symmetric, so
//! the filter is a smoother rather than a lag-reducing average.
//! Lookback: period - 1.

use crate::domain::Candle;
use crate::series::Indicator;

use super::nan_series;

/// Normalized Gaussian kernel of `period` taps, sigma = period / 2.
pub fn gaussian_weights(period: usize) -> Vec<f64> {
    if period == 0 {
        return Vec::new();
    }
    let sigma = period as f64 / 2.0;
    let center = (period as f64 - 1.0) / 2.0;
    let raw: Vec<f64> = (0..period)
        .map(|i| {
            let x = i as f64 - center;
            (-(x * x) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

/// SGMA of an arbitrary series. A window holding a NaN yields NaN.
pub fn sgma(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = nan_series(n);
    if period == 0 || n < period {
        return result;
    }

    let weights = gaussian_weights(period);
    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        // Weight j applies to the value j bars back.
        let value: f64 = window
            .iter()
            .rev()
            .zip(&weights)
            .map(|(v, w)| v * w)
            .sum();
        result[i] = value;
    }
    result
}

#[derive(Debug, Clone)]
pub struct Sgma {
    period: usize,
    name: String,
}

impl Sgma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SGMA period must be >= 1");
        Self {
            period,
            name: format!("sgma_{period}"),
        }
    }
}

impl Indicator for Sgma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        sgma(&closes, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn weights_are_normalized_and_symmetric() {
        let w = gaussian_weights(20);
        assert_eq!(w.len(), 20);
        assert_approx(w.iter().sum::<f64>(), 1.0, 1e-12);
        for i in 0..10 {
            assert_approx(w[i], w[19 - i], 1e-15);
        }
        assert!(w[9] > w[0]);
    }

    #[test]
    fn constant_series_is_unchanged() {
        let result = sgma(&[7.5; 30], 20);
        assert!(result[..19].iter().all(|v| v.is_nan()));
        for v in &result[19..] {
            assert_approx(*v, 7.5, 1e-12);
        }
    }

    #[test]
    fn linear_series_maps_to_window_center() {
        // Symmetric weights over a line give the value at the window midpoint.
        let data: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let result = sgma(&data, 4);
        assert_approx(result[3], 1.5, 1e-12);
        assert_approx(result[9], 7.5, 1e-12);
    }

    #[test]
    fn nan_poisons_window() {
        let mut data = vec![1.0; 8];
        data[4] = f64::NAN;
        let result = sgma(&data, 3);
        assert_approx(result[3], 1.0, DEFAULT_EPSILON);
        assert!(result[4..7].iter().all(|v| v.is_nan()));
        assert_approx(result[7], 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn lookback_matches_first_value() {
        let candles = make_candles(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let ind = Sgma::new(3);
        let result = ind.compute(&candles);
        assert_eq!(result.iter().position(|v| !v.is_nan()), Some(ind.lookback()));
    }
}
