//! Confluence scorer: an alternate path to markers.
//!
//! Every bar after the first is scored against independent conditions, one
//! bullish and one bearish tally:
//!
//! | condition                                           | points |
//! |-----------------------------------------------------|--------|
//! | bullish shape (hammer, engulfing) near support      | 2      |
//! | bullish shape near an interior retracement level    | 2      |
//! | RSI <= oversold                                     | 1      |
//! | Stoch-RSI %K (0..100) <= oversold                   | 1      |
//! | MACD crosses above its signal                       | 1      |
//! | KDJ %K above %D while %K <= oversold                | 1      |
//!
//! The bearish side mirrors each row (shooting star or bearish engulfing near
//! resistance, overbought oscillators, MACD crossing below, %K under %D while
//! overbought). A side fires when it reaches the threshold. When both do, the
//! higher score wins and an even score emits nothing.
//!
//! Support and resistance are confirmed pivots over `level_window` bars on
//! each side, only used once the pivot's right side has closed.

use serde::{Deserialize, Serialize};

use crate::domain::{Candle, Marker, Rule, Side};
use crate::indicators::{kdj, macd, rsi, stoch_rsi, stoch_rsi_kd};
use crate::patterns::{CandleShapes, KeyLevels};
use crate::strategies::Strategy;
use crate::structure::{find_swing_points, SwingMode};

/// Tunables for the scorer. Missing TOML keys take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfluenceParams {
    pub level_window: usize,
    pub threshold: u32,
    pub rsi_period: usize,
    pub stoch_period: usize,
    pub stoch_k: usize,
    pub stoch_d: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub kdj_k: usize,
    pub kdj_d: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub stoch_oversold: f64,
    pub stoch_overbought: f64,
    pub kdj_oversold: f64,
    pub kdj_overbought: f64,
}

impl Default for ConfluenceParams {
    fn default() -> Self {
        Self {
            level_window: 20,
            threshold: 3,
            rsi_period: 14,
            stoch_period: 14,
            stoch_k: 3,
            stoch_d: 3,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            kdj_k: 9,
            kdj_d: 3,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            stoch_oversold: 20.0,
            stoch_overbought: 80.0,
            kdj_oversold: 20.0,
            kdj_overbought: 80.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cross {
    Above,
    Below,
}

/// Everything the scorer looks at for one bar.
///
/// Oscillator fields are `None` while the indicator is still warming up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BarContext {
    pub shapes: CandleShapes,
    pub near_support: bool,
    pub near_resistance: bool,
    /// The low touches an interior retracement level.
    pub low_near_fib: bool,
    /// The high touches an interior retracement level.
    pub high_near_fib: bool,
    pub rsi: Option<f64>,
    /// Stoch-RSI %K on a 0..100 scale.
    pub stoch_k: Option<f64>,
    pub macd_cross: Option<Cross>,
    pub kdj_k: Option<f64>,
    pub kdj_d: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Score {
    pub bullish: u32,
    pub bearish: u32,
}

impl Score {
    /// The side that fires at `threshold`, if any.
    pub fn decide(&self, threshold: u32) -> Option<(Side, u32)> {
        let bull = self.bullish >= threshold;
        let bear = self.bearish >= threshold;
        match (bull, bear) {
            (true, false) => Some((Side::Long, self.bullish)),
            (false, true) => Some((Side::Short, self.bearish)),
            (true, true) if self.bullish > self.bearish => Some((Side::Long, self.bullish)),
            (true, true) if self.bearish > self.bullish => Some((Side::Short, self.bearish)),
            _ => None,
        }
    }
}

/// Score one bar.
pub fn score_bar(ctx: &BarContext, params: &ConfluenceParams) -> Score {
    let mut score = Score::default();
    let below = |v: Option<f64>, limit: f64| v.is_some_and(|v| v <= limit);
    let above = |v: Option<f64>, limit: f64| v.is_some_and(|v| v >= limit);

    if ctx.shapes.bullish() {
        if ctx.near_support {
            score.bullish += 2;
        }
        if ctx.low_near_fib {
            score.bullish += 2;
        }
    }
    if ctx.shapes.bearish() {
        if ctx.near_resistance {
            score.bearish += 2;
        }
        if ctx.high_near_fib {
            score.bearish += 2;
        }
    }

    if below(ctx.rsi, params.rsi_oversold) {
        score.bullish += 1;
    }
    if above(ctx.rsi, params.rsi_overbought) {
        score.bearish += 1;
    }
    if below(ctx.stoch_k, params.stoch_oversold) {
        score.bullish += 1;
    }
    if above(ctx.stoch_k, params.stoch_overbought) {
        score.bearish += 1;
    }

    match ctx.macd_cross {
        Some(Cross::Above) => score.bullish += 1,
        Some(Cross::Below) => score.bearish += 1,
        None => {}
    }

    if let (Some(k), Some(d)) = (ctx.kdj_k, ctx.kdj_d) {
        if k > d && k <= params.kdj_oversold {
            score.bullish += 1;
        }
        if k < d && k >= params.kdj_overbought {
            score.bearish += 1;
        }
    }

    score
}

/// Markers from precomputed bar contexts, one context per candle.
///
/// Bar 0 is never scored. Contexts beyond the candle slice are ignored.
pub fn markers_from_contexts(
    candles: &[Candle],
    contexts: &[BarContext],
    params: &ConfluenceParams,
) -> Vec<Marker> {
    candles
        .iter()
        .zip(contexts)
        .enumerate()
        .skip(1)
        .filter_map(|(i, (bar, ctx))| {
            let (side, points) = score_bar(ctx, params).decide(params.threshold)?;
            Some(Marker::confirmed(
                i,
                bar.time,
                side,
                bar.close,
                Rule::Confluence { score: points },
            ))
        })
        .collect()
}

fn defined(v: f64) -> Option<f64> {
    (!v.is_nan()).then_some(v)
}

#[derive(Debug, Clone, Default)]
pub struct ConfluenceScorer {
    pub params: ConfluenceParams,
}

impl ConfluenceScorer {
    pub fn new(params: ConfluenceParams) -> Self {
        assert!(params.level_window >= 1, "level_window must be >= 1");
        assert!(params.threshold >= 1, "threshold must be >= 1");
        Self { params }
    }

    /// Per-bar contexts for the whole slice.
    pub fn contexts(&self, candles: &[Candle]) -> Vec<BarContext> {
        let p = &self.params;
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
        let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();

        let rsi_values = rsi(&closes, p.rsi_period);
        let (stoch_k, _) = stoch_rsi_kd(
            &stoch_rsi(&rsi_values, p.stoch_period),
            p.stoch_k,
            p.stoch_d,
        );
        let macd_out = macd(&closes, p.macd_fast, p.macd_slow, p.macd_signal);
        let kdj_out = kdj(&highs, &lows, &closes, p.kdj_k, p.kdj_d);
        let swings = find_swing_points(candles, p.level_window, SwingMode::Confirmed);

        (0..candles.len())
            .map(|i| {
                let bar = &candles[i];
                let prev = i.checked_sub(1).map(|j| &candles[j]);
                let levels = KeyLevels::at(&swings, i);

                let macd_cross = prev.and_then(|_| {
                    let (m0, s0) = (macd_out.macd[i - 1], macd_out.signal[i - 1]);
                    let (m1, s1) = (macd_out.macd[i], macd_out.signal[i]);
                    if [m0, s0, m1, s1].iter().any(|v| v.is_nan()) {
                        None
                    } else if m0 <= s0 && m1 > s1 {
                        Some(Cross::Above)
                    } else if m0 >= s0 && m1 < s1 {
                        Some(Cross::Below)
                    } else {
                        None
                    }
                });

                BarContext {
                    shapes: CandleShapes::of(prev, bar),
                    near_support: levels.near_support(bar.low),
                    near_resistance: levels.near_resistance(bar.high),
                    low_near_fib: levels.near_fib(bar.low),
                    high_near_fib: levels.near_fib(bar.high),
                    rsi: defined(rsi_values[i]),
                    stoch_k: defined(stoch_k[i]).map(|k| k * 100.0),
                    macd_cross,
                    kdj_k: defined(kdj_out.k[i]),
                    kdj_d: defined(kdj_out.d[i]),
                }
            })
            .collect()
    }

    /// Bullish/bearish tallies for every bar.
    pub fn scores(&self, candles: &[Candle]) -> Vec<Score> {
        self.contexts(candles)
            .iter()
            .map(|ctx| score_bar(ctx, &self.params))
            .collect()
    }
}

impl Strategy for ConfluenceScorer {
    fn name(&self) -> &str {
        "confluence"
    }

    fn warmup_bars(&self) -> usize {
        let p = &self.params;
        let oscillators = p
            .rsi_period
            .saturating_add(p.stoch_period)
            .saturating_add(p.stoch_k)
            .max(p.macd_slow.saturating_add(p.macd_signal))
            .max(p.kdj_k);
        oscillators.max(p.level_window.saturating_mul(2).saturating_add(1))
    }

    fn markers(&self, candles: &[Candle]) -> Vec<Marker> {
        let contexts = self.contexts(candles);
        markers_from_contexts(candles, &contexts, &self.params)
    }
}
