//! Price crossing a smoothed baseline.
//!
//! LONG when the close moves from below the baseline to above it between two
//! consecutive bars, SHORT on the opposite move. Touching the baseline on
//! either bar is not a cross.

use crate::domain::{Candle, Marker, Rule, Side};
use crate::indicators::sgma;

use super::Strategy;

/// Cross markers of the closes against any aligned baseline series.
pub fn baseline_crosses(candles: &[Candle], baseline: &[f64]) -> Vec<Marker> {
    let n = candles.len().min(baseline.len());
    let mut markers = Vec::new();

    for i in 1..n {
        let (prev_base, base) = (baseline[i - 1], baseline[i]);
        let (prev_close, close) = (candles[i - 1].close, candles[i].close);
        if prev_base.is_nan() || base.is_nan() || prev_close.is_nan() || close.is_nan() {
            continue;
        }

        let bar = &candles[i];
        if prev_close < prev_base && close > base {
            markers.push(Marker::confirmed(i, bar.time, Side::Long, close, Rule::BaselineCrossUp));
        } else if prev_close > prev_base && close < base {
            markers.push(Marker::confirmed(i, bar.time, Side::Short, close, Rule::BaselineCrossDown));
        }
    }

    markers
}

/// Close vs Gaussian-smoothed moving average crossover.
#[derive(Debug, Clone)]
pub struct GaussianCross {
    pub period: usize,
}

impl GaussianCross {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "period must be >= 1");
        Self { period }
    }

    pub fn default_params() -> Self {
        Self::new(20)
    }
}

impl Strategy for GaussianCross {
    fn name(&self) -> &str {
        "gaussian_cross"
    }

    fn warmup_bars(&self) -> usize {
        // Two defined baseline values are needed for a cross.
        self.period
    }

    fn markers(&self, candles: &[Candle]) -> Vec<Marker> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        baseline_crosses(candles, &sgma(&closes, self.period))
    }

    fn memory(&self) -> Option<usize> {
        // The cross at t compares bar t - 1, whose baseline reaches back
        // `period - 1` more bars.
        Some(self.period)
    }
}
