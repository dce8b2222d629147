//! KDJ stochastic oscillator.
//!
//! RSV = (close - lowest low) / (highest high - lowest low) * 100 over the
//! trailing `k_period` bars, 50 on a flat range.
//! K = (1 - a) * prevK + a * RSV, D = (1 - a) * prevD + a * K, J = 3K - 2D,
//! with a = 1 / d_period. The classic recurrence hard-codes 2/3 and 1/3;
//! d_period = 3 (the default) reproduces it exactly and other values widen
//! or narrow the smoothing. prevK and prevD start at 50.
//! Lookback: k_period - 1.

use crate::domain::Candle;
use crate::series::{settle_memory, Indicator};

use super::{nan_series, window_extremes};

/// Neutral value used for a flat range and for the K/D seeds.
const KDJ_NEUTRAL: f64 = 50.0;

#[derive(Debug, Clone, PartialEq)]
pub struct KdjOutput {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
    pub j: Vec<f64>,
}

/// KDJ over aligned high/low/close columns.
///
/// Mismatched column lengths are a caller error; the result is all NaN at
/// the longest of the three lengths.
pub fn kdj(high: &[f64], low: &[f64], close: &[f64], k_period: usize, d_period: usize) -> KdjOutput {
    let n = close.len();
    if high.len() != n || low.len() != n {
        let longest = n.max(high.len()).max(low.len());
        return KdjOutput {
            k: nan_series(longest),
            d: nan_series(longest),
            j: nan_series(longest),
        };
    }

    let mut out = KdjOutput {
        k: nan_series(n),
        d: nan_series(n),
        j: nan_series(n),
    };
    if k_period == 0 || d_period == 0 {
        return out;
    }

    let a = 1.0 / d_period as f64;
    let mut prev_k = KDJ_NEUTRAL;
    let mut prev_d = KDJ_NEUTRAL;

    for i in (k_period - 1)..n {
        let start = i + 1 - k_period;
        let (Some((hh, _)), Some((_, ll))) = (
            window_extremes(&high[start..=i]),
            window_extremes(&low[start..=i]),
        ) else {
            // A gap resets the recursion to the neutral seeds.
            prev_k = KDJ_NEUTRAL;
            prev_d = KDJ_NEUTRAL;
            continue;
        };
        let c = close[i];
        if c.is_nan() {
            prev_k = KDJ_NEUTRAL;
            prev_d = KDJ_NEUTRAL;
            continue;
        }

        let rsv = if hh == ll {
            KDJ_NEUTRAL
        } else {
            (c - ll) / (hh - ll) * 100.0
        };
        let k = (1.0 - a) * prev_k + a * rsv;
        let d = (1.0 - a) * prev_d + a * k;
        out.k[i] = k;
        out.d[i] = d;
        out.j[i] = 3.0 * k - 2.0 * d;
        prev_k = k;
        prev_d = d;
    }

    out
}

/// Which KDJ line an instance exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KdjLine {
    K,
    D,
    J,
}

#[derive(Debug, Clone)]
pub struct Kdj {
    k_period: usize,
    d_period: usize,
    line: KdjLine,
    name: String,
}

impl Kdj {
    pub fn new(k_period: usize, d_period: usize, line: KdjLine) -> Self {
        assert!(k_period >= 1, "KDJ k_period must be >= 1");
        assert!(d_period >= 1, "KDJ d_period must be >= 1");
        let name = match line {
            KdjLine::K => "kdj_k".to_string(),
            KdjLine::D => "kdj_d".to_string(),
            KdjLine::J => "kdj_j".to_string(),
        };
        Self {
            k_period,
            d_period,
            line,
            name,
        }
    }
}

impl Indicator for Kdj {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.k_period - 1
    }

    fn memory(&self) -> Option<usize> {
        Some(settle_memory(self.lookback(), self.d_period))
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let high: Vec<f64> = candles.iter().map(|c| c.high).collect();
        let low: Vec<f64> = candles.iter().map(|c| c.low).collect();
        let close: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let out = kdj(&high, &low, &close, self.k_period, self.d_period);
        match self.line {
            KdjLine::K => out.k,
            KdjLine::D => out.d,
            KdjLine::J => out.j,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn flat_range_stays_neutral() {
        let flat = [10.0; 12];
        let out = kdj(&flat, &flat, &flat, 9, 3);
        assert!(out.k[..8].iter().all(|v| v.is_nan()));
        for i in 8..12 {
            assert_approx(out.k[i], 50.0, DEFAULT_EPSILON);
            assert_approx(out.d[i], 50.0, DEFAULT_EPSILON);
            assert_approx(out.j[i], 50.0, DEFAULT_EPSILON);
        }
        assert!(out.j.iter().all(|v| !v.is_infinite()));
    }

    #[test]
    fn first_value_uses_neutral_seed() {
        let high = [12.0, 14.0, 13.0];
        let low = [8.0, 9.0, 10.0];
        let close = [11.0, 13.0, 12.0];
        let out = kdj(&high, &low, &close, 3, 3);
        // RSV = (12 - 8) / (14 - 8) * 100 = 66.67
        let rsv = 4.0 / 6.0 * 100.0;
        let k = 2.0 / 3.0 * 50.0 + rsv / 3.0;
        let d = 2.0 / 3.0 * 50.0 + k / 3.0;
        assert_approx(out.k[2], k, 1e-9);
        assert_approx(out.d[2], d, 1e-9);
        assert_approx(out.j[2], 3.0 * k - 2.0 * d, 1e-9);
    }

    #[test]
    fn smoothing_weight_follows_d_period() {
        let high = [12.0, 14.0, 13.0];
        let low = [8.0, 9.0, 10.0];
        let close = [11.0, 13.0, 12.0];
        let rsv = 4.0 / 6.0 * 100.0;

        let out = kdj(&high, &low, &close, 3, 5);
        let k = 0.8 * 50.0 + 0.2 * rsv;
        assert_approx(out.k[2], k, 1e-9);
        assert_approx(out.d[2], 0.8 * 50.0 + 0.2 * k, 1e-9);

        let out = kdj(&high, &low, &close, 3, 1);
        assert_approx(out.k[2], rsv, 1e-9);
        assert_approx(out.d[2], rsv, 1e-9);
    }

    #[test]
    fn mismatched_lengths_yield_nan_of_longest() {
        let out = kdj(&[1.0, 2.0, 3.0, 4.0], &[0.5, 1.5], &[1.0, 2.0, 3.0], 2, 3);
        assert_eq!(out.k.len(), 4);
        assert!(out.k.iter().chain(&out.d).chain(&out.j).all(|v| v.is_nan()));
    }

    #[test]
    fn short_input_all_nan() {
        let out = kdj(&[1.0, 2.0], &[0.5, 1.0], &[0.8, 1.5], 9, 3);
        assert!(out.k.iter().all(|v| v.is_nan()));
    }
}
