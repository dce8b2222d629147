//! Stochastic RSI and its %K/%D smoothing.
//!
//! Raw: (rsi[t] - min) / (max - min) over the trailing `period + 1` RSI values
//! (the current one included), on a 0..1 scale. At least `period` of those
//! values must be finite. A flat window (max == min) reads 0.
//! %K = SMA(raw, k_period), %D = SMA(%K, d_period).

use crate::domain::Candle;
use crate::series::{settle_memory, Indicator};

use super::{nan_series, rsi::rsi, sma::sma};

/// Stochastic oscillator of an RSI series.
pub fn stoch_rsi(rsi: &[f64], period: usize) -> Vec<f64> {
    let n = rsi.len();
    let mut result = nan_series(n);

    if period == 0 {
        return result;
    }

    for i in period..n {
        let current = rsi[i];
        if current.is_nan() {
            continue;
        }
        let window = &rsi[i - period..=i];
        let finite = window.iter().filter(|v| !v.is_nan()).count();
        if finite < period {
            continue;
        }
        let (hi, lo) = window
            .iter()
            .filter(|v| !v.is_nan())
            .fold((f64::NEG_INFINITY, f64::INFINITY), |(hi, lo), &v| {
                (hi.max(v), lo.min(v))
            });
        result[i] = if hi == lo { 0.0 } else { (current - lo) / (hi - lo) };
    }

    result
}

/// %K and %D lines of a stochastic series.
pub fn stoch_rsi_kd(stoch: &[f64], k_period: usize, d_period: usize) -> (Vec<f64>, Vec<f64>) {
    let k = sma(stoch, k_period);
    let d = sma(&k, d_period);
    (k, d)
}

/// Which Stoch-RSI line an instance exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StochRsiLine {
    Raw,
    K,
    D,
}

#[derive(Debug, Clone)]
pub struct StochRsi {
    rsi_period: usize,
    stoch_period: usize,
    k_period: usize,
    d_period: usize,
    line: StochRsiLine,
    name: String,
}

impl StochRsi {
    pub fn new(
        rsi_period: usize,
        stoch_period: usize,
        k_period: usize,
        d_period: usize,
        line: StochRsiLine,
    ) -> Self {
        assert!(rsi_period >= 1, "Stoch-RSI rsi_period must be >= 1");
        assert!(stoch_period >= 1, "Stoch-RSI stoch_period must be >= 1");
        assert!(
            k_period >= 1 && d_period >= 1,
            "Stoch-RSI smoothing periods must be >= 1"
        );
        let name = match line {
            StochRsiLine::Raw => "stoch_rsi".to_string(),
            StochRsiLine::K => "stoch_rsi_k".to_string(),
            StochRsiLine::D => "stoch_rsi_d".to_string(),
        };
        Self {
            rsi_period,
            stoch_period,
            k_period,
            d_period,
            line,
            name,
        }
    }

    pub fn k(rsi_period: usize, stoch_period: usize, k_period: usize, d_period: usize) -> Self {
        Self::new(rsi_period, stoch_period, k_period, d_period, StochRsiLine::K)
    }

    pub fn d(rsi_period: usize, stoch_period: usize, k_period: usize, d_period: usize) -> Self {
        Self::new(rsi_period, stoch_period, k_period, d_period, StochRsiLine::D)
    }
}

impl Indicator for StochRsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        let raw = self.rsi_period + self.stoch_period - 1;
        match self.line {
            StochRsiLine::Raw => raw,
            StochRsiLine::K => raw + self.k_period - 1,
            StochRsiLine::D => raw + self.k_period + self.d_period - 2,
        }
    }

    fn memory(&self) -> Option<usize> {
        Some(settle_memory(self.lookback(), self.rsi_period))
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let raw = stoch_rsi(&rsi(&closes, self.rsi_period), self.stoch_period);
        match self.line {
            StochRsiLine::Raw => raw,
            StochRsiLine::K => stoch_rsi_kd(&raw, self.k_period, self.d_period).0,
            StochRsiLine::D => stoch_rsi_kd(&raw, self.k_period, self.d_period).1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn stoch_of_known_window() {
        let rsi = [f64::NAN, 30.0, 50.0, 70.0, 40.0];
        let result = stoch_rsi(&rsi, 3);
        assert!(result[..3].iter().all(|v| v.is_nan()));
        // i=3: window [NaN,30,50,70] has 3 finite → (70-30)/(70-30) = 1
        assert_approx(result[3], 1.0, DEFAULT_EPSILON);
        // i=4: window [30,50,70,40] → (40-30)/40 = 0.25
        assert_approx(result[4], 0.25, DEFAULT_EPSILON);
    }

    #[test]
    fn flat_window_reads_zero() {
        let result = stoch_rsi(&[50.0; 6], 3);
        assert!(result[3..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn kd_are_nested_smas() {
        let stoch = [0.0, 0.5, 1.0, 0.5, 0.0, 0.5];
        let (k, d) = stoch_rsi_kd(&stoch, 3, 2);
        assert!(k[1].is_nan());
        assert_approx(k[2], 0.5, DEFAULT_EPSILON);
        assert_approx(k[3], 2.0 / 3.0, DEFAULT_EPSILON);
        assert!(d[2].is_nan());
        assert_approx(d[3], (0.5 + 2.0 / 3.0) / 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn stoch_rsi_k_lookback_matches_first_value() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0)
            .collect();
        let candles = make_candles(&closes);
        let ind = StochRsi::k(14, 14, 3, 3);
        let result = ind.compute(&candles);
        let first = result.iter().position(|v| !v.is_nan()).unwrap();
        assert_eq!(first, ind.lookback());
        assert!(result[first..]
            .iter()
            .all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn short_input_all_nan() {
        let candles = make_candles(&[1.0, 2.0, 3.0]);
        let result = StochRsi::d(14, 14, 3, 3).compute(&candles);
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|v| v.is_nan()));
    }
}
