//! Series math: stateless indicator functions.
//!
//! Every function returns a vector of the same length as its input, with
//! `f64::NAN` wherever there is not enough history. Short inputs yield an
//! all-NaN vector; none of these functions panic on short or empty input.
//!
//! Each indicator is available as a free function over `&[f64]` and as a
//! named `Indicator` over `&[Candle]` for the chart session. Multi-line
//! indicators (MACD, KDJ, Stoch-RSI, SMI) are exposed as one named instance
//! per line, keeping the single-series `Indicator` trait unchanged.
//!
//! None of the functions are reentrant-safe against concurrent mutation of
//! their input slices; callers serialize access to a live candle sequence.

pub mod atr;
pub mod ema;
pub mod fibonacci;
pub mod gaussian;
pub mod kdj;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod smi;
pub mod stoch_rsi;
pub mod supertrend;

pub use atr::{atr, true_range, wilder_smooth, Atr};
pub use ema::{ema, Ema};
pub use fibonacci::{fibonacci_levels, retracement_band, FibLevel, FIB_RATIOS};
pub use gaussian::{gaussian_weights, sgma, Sgma};
pub use kdj::{kdj, Kdj, KdjLine, KdjOutput};
pub use macd::{macd, Macd, MacdLine, MacdOutput};
pub use rsi::{rsi, Rsi, RSI_LOSS_EPSILON};
pub use sma::{sma, Sma};
pub use smi::{smi, Smi, SmiLine, SmiMode, SmiOutput};
pub use stoch_rsi::{stoch_rsi, stoch_rsi_kd, StochRsi, StochRsiLine};
pub use supertrend::{supertrend, Supertrend, SupertrendOutput, Trend, TrendFlip};

/// An all-NaN series of length `n`.
pub(crate) fn nan_series(n: usize) -> Vec<f64> {
    vec![f64::NAN; n]
}

/// Max and min of a window, `None` if the window is empty or holds a NaN.
pub(crate) fn window_extremes(values: &[f64]) -> Option<(f64, f64)> {
    let mut hi = f64::NEG_INFINITY;
    let mut lo = f64::INFINITY;
    for &v in values {
        if v.is_nan() {
            return None;
        }
        hi = hi.max(v);
        lo = lo.min(v);
    }
    if values.is_empty() {
        None
    } else {
        Some((hi, lo))
    }
}

/// Create synthetic candles from close prices for testing.
///
/// open = prev close (or close for the first candle),
/// high = max(open, close) + 1.0, low = min(open, close) - 1.0,
/// one-minute buckets, volume = 1000.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<crate::domain::Candle> {
    use crate::domain::Candle;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                time: 1_700_000_000 + i as i64 * 60,
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
