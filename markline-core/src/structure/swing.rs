//! Swing point detection.
//!
//! A swing high at index i has a high strictly above every other high in the
//! comparison window; a swing low is the mirror image on lows. The window and
//! the moment the swing becomes known depend on the [`SwingMode`].

use serde::{Deserialize, Serialize};

use crate::domain::Candle;

/// How far a swing test may look and when its result is considered known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingMode {
    /// Compares `window` bars on both sides and treats the swing as known at
    /// its own index. Uses future bars; for batch analysis of closed history.
    Centered,
    /// Same pivot test as `Centered`, but the swing is only known once the
    /// `window` bars after it have closed. Safe for live markers.
    #[default]
    Confirmed,
    /// Compares only the `window` bars before i, known at i. Every new
    /// running high of the window qualifies.
    Trailing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingKind {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SwingPoint {
    pub index: usize,
    pub kind: SwingKind,
    /// The high for a swing high, the low for a swing low.
    pub price: f64,
    /// First bar index at which the swing can be known.
    pub confirmed_at: usize,
}

/// Swing highs and lows, each ordered by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SwingPoints {
    pub highs: Vec<SwingPoint>,
    pub lows: Vec<SwingPoint>,
}

impl SwingPoints {
    /// The swings known at bar `boundary`.
    pub fn known_at(&self, boundary: usize) -> SwingPoints {
        let keep = |points: &[SwingPoint]| {
            points
                .iter()
                .filter(|p| p.confirmed_at <= boundary)
                .copied()
                .collect()
        };
        SwingPoints {
            highs: keep(&self.highs),
            lows: keep(&self.lows),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.highs.is_empty() && self.lows.is_empty()
    }
}

/// Find swing highs and lows over `candles`.
///
/// A zero window yields no swings.
pub fn find_swing_points(candles: &[Candle], window: usize, mode: SwingMode) -> SwingPoints {
    let mut points = SwingPoints::default();
    let n = candles.len();
    if window == 0 || n <= window {
        return points;
    }

    let (last, lead) = match mode {
        SwingMode::Centered | SwingMode::Confirmed => {
            if n <= window.saturating_mul(2) {
                return points;
            }
            (n - window, window)
        }
        SwingMode::Trailing => (n, 0),
    };

    for i in window..last {
        let bar = &candles[i];
        let neighbors = candles[i - window..i]
            .iter()
            .chain(&candles[i + 1..=i + lead]);

        let (mut is_high, mut is_low) = (!bar.high.is_nan(), !bar.low.is_nan());
        for other in neighbors {
            is_high &= other.high < bar.high;
            is_low &= other.low > bar.low;
            if !is_high && !is_low {
                break;
            }
        }

        let confirmed_at = match mode {
            SwingMode::Confirmed => i + window,
            SwingMode::Centered | SwingMode::Trailing => i,
        };
        if is_high {
            points.highs.push(SwingPoint {
                index: i,
                kind: SwingKind::High,
                price: bar.high,
                confirmed_at,
            });
        }
        if is_low {
            points.lows.push(SwingPoint {
                index: i,
                kind: SwingKind::Low,
                price: bar.low,
                confirmed_at,
            });
        }
    }

    points
}
