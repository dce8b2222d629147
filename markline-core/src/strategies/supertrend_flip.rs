//! Supertrend direction flips promoted to markers.
//!
//! Every flip of the ATR band is a marker on the flip bar at its close:
//! LONG when the trend turns up, SHORT when it turns down. The first bar
//! with a defined band never counts as a flip.

use crate::domain::{Candle, Marker, Rule, Side};
use crate::indicators::{supertrend, Trend};

use super::Strategy;

#[derive(Debug, Clone)]
pub struct SupertrendFlip {
    pub period: usize,
    pub multiplier: f64,
}

impl SupertrendFlip {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 1, "period must be >= 1");
        assert!(multiplier > 0.0, "multiplier must be > 0");
        Self { period, multiplier }
    }

    pub fn default_params() -> Self {
        Self::new(10, 3.0)
    }
}

impl Strategy for SupertrendFlip {
    fn name(&self) -> &str {
        "trend_flip"
    }

    fn warmup_bars(&self) -> usize {
        // ATR lookback plus one bar to compare against.
        self.period + 1
    }

    fn markers(&self, candles: &[Candle]) -> Vec<Marker> {
        supertrend(candles, self.period, self.multiplier)
            .flips
            .into_iter()
            .map(|flip| {
                let bar = &candles[flip.index];
                let (side, rule) = match flip.trend {
                    Trend::Up => (Side::Long, Rule::TrendFlipUp),
                    Trend::Down => (Side::Short, Rule::TrendFlipDown),
                };
                Marker::confirmed(flip.index, bar.time, side, bar.close, rule)
            })
            .collect()
    }
}
