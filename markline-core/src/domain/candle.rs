//! Candle — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// One OHLCV bar for a fixed time bucket.
///
/// `time` is seconds since the Unix epoch and identifies the bucket. Within a
/// normalized series times are unique and strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Absolute body size.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn body_top(&self) -> f64 {
        self.open.max(self.close)
    }

    pub fn body_bottom(&self) -> f64 {
        self.open.min(self.close)
    }

    pub fn upper_wick(&self) -> f64 {
        self.high - self.body_top()
    }

    pub fn lower_wick(&self) -> f64 {
        self.body_bottom() - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Returns true if any price field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity: `low <= open, close <= high` and non-negative volume.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.volume >= 0.0
    }

    /// Bucket start as a UTC timestamp. `None` if out of chrono's range.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.time, 0)
    }
}

/// Deduplicate by `time` (first occurrence wins), then sort ascending.
///
/// The sort is stable, so the relative order of distinct times coming from
/// the same source is irrelevant to the result.
pub fn normalize_candles(candles: Vec<Candle>) -> Vec<Candle> {
    let supplied = candles.len();
    let mut seen = HashSet::with_capacity(supplied);
    let mut unique: Vec<Candle> = candles
        .into_iter()
        .filter(|c| seen.insert(c.time))
        .collect();

    let dropped = supplied - unique.len();
    if dropped > 0 {
        warn!(dropped, "dropped candles with duplicate timestamps");
    }

    if !unique.windows(2).all(|w| w[0].time < w[1].time) {
        unique.sort_by_key(|c| c.time);
    }
    unique
}

/// Extract one price column.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

pub fn highs(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.high).collect()
}

pub fn lows(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.low).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Candle {
        Candle::new(1_700_000_000, 100.0, 105.0, 98.0, 103.0, 5_000.0)
    }

    #[test]
    fn candle_parts() {
        let c = sample();
        assert_eq!(c.body(), 3.0);
        assert_eq!(c.upper_wick(), 2.0);
        assert_eq!(c.lower_wick(), 2.0);
        assert!(c.is_bullish());
        assert!(!c.is_bearish());
    }

    #[test]
    fn candle_is_sane() {
        assert!(sample().is_sane());
        let mut c = sample();
        c.high = 97.0;
        assert!(!c.is_sane());
        let mut c = sample();
        c.close = f64::NAN;
        assert!(c.is_void());
        assert!(!c.is_sane());
    }

    #[test]
    fn datetime_conversion() {
        let dt = sample().datetime().unwrap();
        assert_eq!(dt.timestamp(), 1_700_000_000);
    }

    #[test]
    fn normalize_keeps_first_duplicate() {
        let candles = vec![
            Candle::new(60, 1.0, 1.0, 1.0, 1.0, 0.0),
            Candle::new(120, 2.0, 2.0, 2.0, 2.0, 0.0),
            Candle::new(60, 9.0, 9.0, 9.0, 9.0, 0.0),
        ];
        let out = normalize_candles(candles);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].time, 60);
        assert_eq!(out[0].close, 1.0);
    }

    #[test]
    fn normalize_sorts_ascending() {
        let candles = vec![
            Candle::new(180, 3.0, 3.0, 3.0, 3.0, 0.0),
            Candle::new(60, 1.0, 1.0, 1.0, 1.0, 0.0),
            Candle::new(120, 2.0, 2.0, 2.0, 2.0, 0.0),
        ];
        let times: Vec<i64> = normalize_candles(candles).iter().map(|c| c.time).collect();
        assert_eq!(times, vec![60, 120, 180]);
    }

    #[test]
    fn serde_defaults_missing_volume() {
        let c: Candle =
            serde_json::from_str(r#"{"time":60,"open":1,"high":2,"low":0.5,"close":1.5}"#)
                .unwrap();
        assert_eq!(c.volume, 0.0);
    }
}
