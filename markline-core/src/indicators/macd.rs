//! Moving Average Convergence/Divergence (MACD).
//!
//! macd = EMA(fast) - EMA(slow). The signal line is the EMA of the defined
//! macd values only, written back onto the indices those values came from.
//! Running the signal EMA over the raw series would seed it on NaN and never
//! produce a value, so the compaction step is required.
//! histogram = macd - signal wherever both are defined.

use crate::domain::Candle;
use crate::series::{settle_memory, Indicator};

use super::{ema::ema, nan_series};

/// The three MACD lines, each the length of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdOutput {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl MacdOutput {
    fn empty(n: usize) -> Self {
        Self {
            macd: nan_series(n),
            signal: nan_series(n),
            histogram: nan_series(n),
        }
    }
}

/// MACD of an arbitrary series.
pub fn macd(values: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdOutput {
    let n = values.len();
    let mut out = MacdOutput::empty(n);

    if fast == 0 || slow == 0 || signal_period == 0 || n < slow {
        return out;
    }

    let fast_ema = ema(values, fast);
    let slow_ema = ema(values, slow);

    let mut defined = Vec::with_capacity(n);
    let mut positions = Vec::with_capacity(n);
    for i in 0..n {
        let v = fast_ema[i] - slow_ema[i];
        if !v.is_nan() {
            out.macd[i] = v;
            defined.push(v);
            positions.push(i);
        }
    }

    let compact_signal = ema(&defined, signal_period);
    for (&i, &s) in positions.iter().zip(&compact_signal) {
        out.signal[i] = s;
        if !s.is_nan() {
            out.histogram[i] = out.macd[i] - s;
        }
    }

    out
}

/// Which MACD line an instance exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be shorter than slow");
        let name = match line {
            MacdLine::Macd => "macd".to_string(),
            MacdLine::Signal => "macd_signal".to_string(),
            MacdLine::Histogram => "macd_histogram".to_string(),
        };
        Self {
            fast,
            slow,
            signal,
            line,
            name,
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.line {
            MacdLine::Macd => self.slow - 1,
            MacdLine::Signal | MacdLine::Histogram => self.slow + self.signal - 2,
        }
    }

    fn memory(&self) -> Option<usize> {
        Some(settle_memory(self.lookback(), self.slow.max(self.signal)))
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let out = macd(&closes, self.fast, self.slow, self.signal);
        match self.line {
            MacdLine::Macd => out.macd,
            MacdLine::Signal => out.signal,
            MacdLine::Histogram => out.histogram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles};

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 4.0 + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn histogram_is_macd_minus_signal() {
        let out = macd(&wave(80), 12, 26, 9);
        for i in 0..80 {
            let both = !out.macd[i].is_nan() && !out.signal[i].is_nan();
            if both {
                assert_approx(out.histogram[i], out.macd[i] - out.signal[i], 1e-12);
            } else {
                assert!(out.histogram[i].is_nan(), "histogram defined at {i}");
            }
        }
    }

    #[test]
    fn signal_starts_after_realignment() {
        let out = macd(&wave(80), 12, 26, 9);
        assert!(out.macd[24].is_nan());
        assert!(!out.macd[25].is_nan());
        // Signal seeds on the 9th defined macd value: index 25 + 8.
        assert!(out.signal[32].is_nan());
        assert!(!out.signal[33].is_nan());
        let mean = out.macd[25..=33].iter().sum::<f64>() / 9.0;
        assert_approx(out.signal[33], mean, 1e-9);
    }

    #[test]
    fn short_input_is_all_nan() {
        let out = macd(&wave(20), 12, 26, 9);
        assert_eq!(out.macd.len(), 20);
        assert!(out.macd.iter().all(|v| v.is_nan()));
        assert!(out.signal.iter().all(|v| v.is_nan()));
        assert!(out.histogram.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn lines_match_lookback() {
        let candles = make_candles(&wave(80));
        for line in [MacdLine::Macd, MacdLine::Signal, MacdLine::Histogram] {
            let ind = Macd::new(12, 26, 9, line);
            let result = ind.compute(&candles);
            let first = result.iter().position(|v| !v.is_nan()).unwrap();
            assert_eq!(first, ind.lookback(), "{}", ind.name());
        }
    }
}
