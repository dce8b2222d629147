//! Break of structure: a close beyond the most recent prior swing extreme.

use serde::{Deserialize, Serialize};

use crate::domain::Candle;

use super::swing::{SwingPoint, SwingPoints};

/// Relative margin a close must clear beyond the swing level.
pub const BREAK_TOLERANCE: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StructureBreak {
    pub index: usize,
    pub direction: BreakDirection,
    /// The swing price that was broken.
    pub level: f64,
}

/// Structure breaks for every bar in `1..=up_to`.
///
/// Bar i is compared against the latest swing with index < i that is known
/// by bar i and does not lie beyond `up_to`. A close above that high by more
/// than [`BREAK_TOLERANCE`] is a break up; below that low by more than the
/// same margin is a break down.
pub fn detect_structure_breaks(
    candles: &[Candle],
    swings: &SwingPoints,
    up_to: usize,
) -> Vec<StructureBreak> {
    let mut breaks = Vec::new();
    if candles.is_empty() {
        return breaks;
    }
    let last = up_to.min(candles.len() - 1);

    for (i, bar) in candles.iter().enumerate().take(last + 1).skip(1) {
        if bar.close.is_nan() {
            continue;
        }
        if let Some(high) = prior_swing(&swings.highs, i) {
            if bar.close > high.price * (1.0 + BREAK_TOLERANCE) {
                breaks.push(StructureBreak {
                    index: i,
                    direction: BreakDirection::Up,
                    level: high.price,
                });
            }
        }
        if let Some(low) = prior_swing(&swings.lows, i) {
            if bar.close < low.price * (1.0 - BREAK_TOLERANCE) {
                breaks.push(StructureBreak {
                    index: i,
                    direction: BreakDirection::Down,
                    level: low.price,
                });
            }
        }
    }

    breaks
}

fn prior_swing(points: &[SwingPoint], i: usize) -> Option<&SwingPoint> {
    points
        .iter()
        .rev()
        .find(|p| p.index < i && p.confirmed_at <= i)
}
