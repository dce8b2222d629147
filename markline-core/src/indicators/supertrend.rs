//! Supertrend: ATR volatility band that follows the prevailing trend.
//!
//! basic upper = hl2 + mult * ATR, basic lower = hl2 - mult * ATR.
//! The upper band only moves down while the previous close stays under it,
//! the lower band only moves up while the previous close stays over it.
//! The trend starts up at the first bar with a defined ATR and flips when the
//! close crosses the band on the opposite side.
//!
//! The active line is the lower band (support) while trending up and the
//! upper band (resistance) while trending down.
//! Lookback: atr period.

use serde::{Deserialize, Serialize};

use crate::domain::Candle;
use crate::series::Indicator;

use super::{atr::atr, nan_series};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
}

/// A change of direction at `index`; `trend` is the new direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendFlip {
    pub index: usize,
    pub trend: Trend,
}

#[derive(Debug, Clone, Default)]
pub struct SupertrendOutput {
    pub line: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
    pub trend: Vec<Option<Trend>>,
    pub flips: Vec<TrendFlip>,
}

/// Supertrend over candles.
pub fn supertrend(candles: &[Candle], period: usize, multiplier: f64) -> SupertrendOutput {
    let n = candles.len();
    let mut out = SupertrendOutput {
        line: nan_series(n),
        upper: nan_series(n),
        lower: nan_series(n),
        trend: vec![None; n],
        flips: Vec::new(),
    };

    let atr = atr(candles, period);
    let Some(start) = atr.iter().position(|v| !v.is_nan()) else {
        return out;
    };

    let hl2 = (candles[start].high + candles[start].low) / 2.0;
    let mut upper = hl2 + multiplier * atr[start];
    let mut lower = hl2 - multiplier * atr[start];
    let mut trend = Trend::Up;
    out.upper[start] = upper;
    out.lower[start] = lower;
    out.line[start] = lower;
    out.trend[start] = Some(trend);

    for i in (start + 1)..n {
        let bar = &candles[i];
        if atr[i].is_nan() || bar.close.is_nan() || bar.high.is_nan() || bar.low.is_nan() {
            continue;
        }

        let hl2 = (bar.high + bar.low) / 2.0;
        let basic_upper = hl2 + multiplier * atr[i];
        let basic_lower = hl2 - multiplier * atr[i];

        let prev_close = candles[i - 1].close;
        upper = if !prev_close.is_nan() && prev_close <= upper {
            basic_upper.min(upper)
        } else {
            basic_upper
        };
        lower = if !prev_close.is_nan() && prev_close >= lower {
            basic_lower.max(lower)
        } else {
            basic_lower
        };

        let next = match trend {
            Trend::Up if bar.close < lower => Trend::Down,
            Trend::Down if bar.close > upper => Trend::Up,
            same => same,
        };
        if next != trend {
            out.flips.push(TrendFlip { index: i, trend: next });
            trend = next;
        }

        out.upper[i] = upper;
        out.lower[i] = lower;
        out.trend[i] = Some(trend);
        out.line[i] = match trend {
            Trend::Up => lower,
            Trend::Down => upper,
        };
    }

    out
}

#[derive(Debug, Clone)]
pub struct Supertrend {
    period: usize,
    multiplier: f64,
    name: String,
}

impl Supertrend {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 1, "Supertrend period must be >= 1");
        assert!(multiplier > 0.0, "Supertrend multiplier must be positive");
        Self {
            period,
            multiplier,
            name: format!("supertrend_{period}_{multiplier}"),
        }
    }
}

impl Indicator for Supertrend {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn memory(&self) -> Option<usize> {
        // Band ratchets carry state from the first bar on.
        None
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        supertrend(candles, self.period, self.multiplier).line
    }
}
