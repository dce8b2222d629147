//! Indicator trait and the named series container.
//!
//! Indicators are pure functions: candle history in, numeric series out.
//! Every output series is index-aligned with the candle slice it was computed
//! from and has exactly the same length. Entries without enough history are
//! `f64::NAN`.

use crate::domain::Candle;
use serde::Serialize;

/// Periods a recursive smoother runs before its seed stops showing:
/// (1 - 1/p)^(30p) < e^-30.
pub const SETTLE_PERIODS: usize = 30;

/// `lookback + SETTLE_PERIODS * period`, saturating.
pub fn settle_memory(lookback: usize, period: usize) -> usize {
    lookback.saturating_add(SETTLE_PERIODS.saturating_mul(period))
}

/// Trait for chart indicators.
///
/// # Look-ahead guard
/// No value at bar t may depend on candle data from bar t+1 or later. Every
/// indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Series name (e.g. "sma_60", "macd_signal").
    fn name(&self) -> &str;

    /// Number of leading bars that are NaN on clean input.
    fn lookback(&self) -> usize;

    /// Bars before a changed bar that a windowed recompute must include for
    /// values from that bar on to match the full series. Recursive smoothers
    /// report enough bars to forget their seed (see [`SETTLE_PERIODS`]).
    /// `None` when values depend on the whole history.
    fn memory(&self) -> Option<usize> {
        Some(self.lookback())
    }

    /// Compute over the whole slice. Output length equals `candles.len()`.
    fn compute(&self, candles: &[Candle]) -> Vec<f64>;
}

/// Named series aligned with one candle sequence, in insertion order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeriesSet {
    entries: Vec<(String, Vec<f64>)>,
}

impl SeriesSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named series, replacing any series of the same name.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = values,
            None => self.entries.push((name, values)),
        }
    }

    /// Value at a bar index. `None` when the name or index is unknown.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.get_series(name)
            .and_then(|v| v.get(bar_index).copied())
    }

    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Last value of a series, `None` when missing or NaN.
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.get_series(name)
            .and_then(|v| v.last().copied())
            .filter(|v| !v.is_nan())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// Replace `series[start..]` with `tail`, resizing to `start + tail.len()`.
    ///
    /// Used by the windowed recompute: values before `start` are kept as is.
    pub fn splice_tail(&mut self, name: &str, start: usize, tail: &[f64]) {
        if let Some((_, values)) = self.entries.iter_mut().find(|(n, _)| n == name) {
            values.truncate(start);
            values.resize(start, f64::NAN);
            values.extend_from_slice(tail);
        } else {
            let mut values = vec![f64::NAN; start];
            values.extend_from_slice(tail);
            self.entries.push((name.to_string(), values));
        }
    }

    /// Number of series stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
