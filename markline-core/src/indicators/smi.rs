//! Stochastic Momentum Index oscillator (SMI).
//!
//! diff  = close - (HH + LL) / 2 over the trailing `period` bars
//! range = (HH - LL) / 2
//! Both are double-smoothed with the NaN-tolerant EMA, then
//! raw = diff2 / max(|range2|, floor, 1e-10), where floor is 1e-3 times the
//! running mean of |range2| seen so far. The running mean only uses bars up
//! to the current one, so the oscillator never looks ahead.
//!
//! Signal = EMA(smi, signal_period); histogram = smi - signal.

use serde::{Deserialize, Serialize};

use crate::domain::Candle;
use crate::series::Indicator;

use super::{ema::ema, nan_series, window_extremes};

const SMI_TINY: f64 = 1e-10;
const SMI_FLOOR_FACTOR: f64 = 1e-3;
const SMI_PERCENT_CLAMP: f64 = 500.0;

/// Output scaling of the raw ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmiMode {
    /// raw * 100, clamped to +/-500.
    Percent,
    /// tanh(raw), in (-1, 1).
    #[default]
    Normalized,
    /// (1 + tanh(raw)) / 2, in (0, 1).
    ZeroOne,
}

impl SmiMode {
    fn scale(self, raw: f64) -> f64 {
        match self {
            SmiMode::Percent => (raw * 100.0).clamp(-SMI_PERCENT_CLAMP, SMI_PERCENT_CLAMP),
            SmiMode::Normalized => raw.tanh(),
            SmiMode::ZeroOne => 0.5 * (1.0 + raw.tanh()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmiOutput {
    pub smi: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl SmiOutput {
    fn empty(n: usize) -> Self {
        Self {
            smi: nan_series(n),
            signal: nan_series(n),
            histogram: nan_series(n),
        }
    }
}

/// SMI over aligned high/low/close columns.
///
/// Mismatched column lengths are a caller error; the result is all NaN at
/// the longest of the three lengths.
#[allow(clippy::too_many_arguments)]
pub fn smi(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    period: usize,
    smooth_a: usize,
    smooth_b: usize,
    signal_period: usize,
    mode: SmiMode,
) -> SmiOutput {
    let n = close.len();
    if high.len() != n || low.len() != n {
        return SmiOutput::empty(n.max(high.len()).max(low.len()));
    }
    let mut out = SmiOutput::empty(n);
    if n == 0 || period == 0 {
        return out;
    }

    let mut diff = nan_series(n);
    let mut range = nan_series(n);
    for i in (period - 1)..n {
        let start = i + 1 - period;
        let (Some((hh, _)), Some((_, ll))) = (
            window_extremes(&high[start..=i]),
            window_extremes(&low[start..=i]),
        ) else {
            continue;
        };
        diff[i] = close[i] - (hh + ll) / 2.0;
        range[i] = (hh - ll) / 2.0;
    }

    let diff2 = ema(&ema(&diff, smooth_a), smooth_b);
    let range2 = ema(&ema(&range, smooth_a), smooth_b);

    let mut range_sum = 0.0;
    let mut range_count = 0usize;
    for i in 0..n {
        let (d, r) = (diff2[i], range2[i]);
        if d.is_nan() || r.is_nan() {
            continue;
        }
        if r.abs() > 0.0 {
            range_sum += r.abs();
            range_count += 1;
        }
        let floor = if range_count > 0 {
            range_sum / range_count as f64 * SMI_FLOOR_FACTOR
        } else {
            0.0
        };
        let denom = r.abs().max(floor).max(SMI_TINY);
        out.smi[i] = mode.scale(d / denom);
    }

    out.signal = ema(&out.smi, signal_period);
    for i in 0..n {
        if !out.smi[i].is_nan() && !out.signal[i].is_nan() {
            out.histogram[i] = out.smi[i] - out.signal[i];
        }
    }

    out
}

/// Which SMI line an instance exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmiLine {
    Smi,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Smi {
    period: usize,
    smooth_a: usize,
    smooth_b: usize,
    signal: usize,
    mode: SmiMode,
    line: SmiLine,
    name: String,
}

impl Smi {
    pub fn new(
        period: usize,
        smooth_a: usize,
        smooth_b: usize,
        signal: usize,
        mode: SmiMode,
        line: SmiLine,
    ) -> Self {
        assert!(period >= 1, "SMI period must be >= 1");
        assert!(
            smooth_a >= 1 && smooth_b >= 1 && signal >= 1,
            "SMI smoothing periods must be >= 1"
        );
        let name = match line {
            SmiLine::Smi => "smi".to_string(),
            SmiLine::Signal => "smi_signal".to_string(),
            SmiLine::Histogram => "smi_histogram".to_string(),
        };
        Self {
            period,
            smooth_a,
            smooth_b,
            signal,
            mode,
            line,
            name,
        }
    }
}

impl Indicator for Smi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        let base = self.period + self.smooth_a + self.smooth_b - 3;
        match self.line {
            SmiLine::Smi => base,
            SmiLine::Signal | SmiLine::Histogram => base + self.signal - 1,
        }
    }

    fn memory(&self) -> Option<usize> {
        // The range floor is a running mean over every bar so far.
        None
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let high: Vec<f64> = candles.iter().map(|c| c.high).collect();
        let low: Vec<f64> = candles.iter().map(|c| c.low).collect();
        let close: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let out = smi(
            &high,
            &low,
            &close,
            self.period,
            self.smooth_a,
            self.smooth_b,
            self.signal,
            self.mode,
        );
        match self.line {
            SmiLine::Smi => out.smi,
            SmiLine::Signal => out.signal,
            SmiLine::Histogram => out.histogram,
        }
    }
}
