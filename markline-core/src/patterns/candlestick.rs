//! Single- and two-bar candlestick shapes.

use serde::Serialize;

use crate::domain::Candle;

/// Long lower wick, short upper wick: wick > 2x body, upper wick < body.
pub fn is_hammer(c: &Candle) -> bool {
    let body = c.body();
    body > 0.0 && c.lower_wick() > 2.0 * body && c.upper_wick() < body
}

/// Mirror of the hammer: upper wick > 2x body, lower wick < body.
pub fn is_shooting_star(c: &Candle) -> bool {
    let body = c.body();
    body > 0.0 && c.upper_wick() > 2.0 * body && c.lower_wick() < body
}

/// A bearish bar followed by a bullish bar whose body covers it.
pub fn is_bullish_engulfing(prev: &Candle, cur: &Candle) -> bool {
    prev.is_bearish() && cur.is_bullish() && engulfs(cur, prev)
}

/// A bullish bar followed by a bearish bar whose body covers it.
pub fn is_bearish_engulfing(prev: &Candle, cur: &Candle) -> bool {
    prev.is_bullish() && cur.is_bearish() && engulfs(cur, prev)
}

fn engulfs(outer: &Candle, inner: &Candle) -> bool {
    outer.body_bottom() <= inner.body_bottom() && outer.body_top() >= inner.body_top()
}

/// Reversal shapes present on one bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CandleShapes {
    pub hammer: bool,
    pub shooting_star: bool,
    pub bullish_engulfing: bool,
    pub bearish_engulfing: bool,
}

impl CandleShapes {
    /// Shapes of `cur`, with `prev` for the two-bar patterns.
    pub fn of(prev: Option<&Candle>, cur: &Candle) -> Self {
        Self {
            hammer: is_hammer(cur),
            shooting_star: is_shooting_star(cur),
            bullish_engulfing: prev.is_some_and(|p| is_bullish_engulfing(p, cur)),
            bearish_engulfing: prev.is_some_and(|p| is_bearish_engulfing(p, cur)),
        }
    }

    pub fn bullish(&self) -> bool {
        self.hammer || self.bullish_engulfing
    }

    pub fn bearish(&self) -> bool {
        self.shooting_star || self.bearish_engulfing
    }
}
