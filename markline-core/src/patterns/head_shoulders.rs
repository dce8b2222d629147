//! Head-and-shoulders and inverse head-and-shoulders.
//!
//! A pattern is three consecutive swings on the same side: the head more
//! extreme than both shoulders, the shoulders within `tolerance` of each other
//! relative to the head. A pattern only becomes a marker once it is
//! corroborated by both a structure break after the head and a retracement
//! of the right shoulder into the 50%..61.8% zone.

use serde::Serialize;

use crate::domain::{Candle, Marker, Rule, Side};
use crate::indicators::retracement_band;
use crate::structure::{BreakDirection, StructureBreak, SwingPoint, SwingPoints};

/// Default relative shoulder mismatch allowed.
pub const SHOULDER_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PatternParams {
    pub tolerance: f64,
    /// Optional cap on the bar distance between each shoulder and the head.
    pub max_shoulder_distance: Option<usize>,
}

impl Default for PatternParams {
    fn default() -> Self {
        Self {
            tolerance: SHOULDER_TOLERANCE,
            max_shoulder_distance: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Three highs, bearish.
    HeadAndShoulders,
    /// Three lows, bullish.
    Inverse,
}

impl PatternKind {
    pub fn side(self) -> Side {
        match self {
            PatternKind::HeadAndShoulders => Side::Short,
            PatternKind::Inverse => Side::Long,
        }
    }

    pub fn rule(self) -> Rule {
        match self {
            PatternKind::HeadAndShoulders => Rule::HeadAndShoulders,
            PatternKind::Inverse => Rule::InverseHeadAndShoulders,
        }
    }

    fn confirming_break(self) -> BreakDirection {
        match self {
            PatternKind::HeadAndShoulders => BreakDirection::Down,
            PatternKind::Inverse => BreakDirection::Up,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeadShoulders {
    pub kind: PatternKind,
    pub left: SwingPoint,
    pub head: SwingPoint,
    pub right: SwingPoint,
}

/// Both pattern kinds among the swings known at `boundary`, ordered by
/// right-shoulder index within each kind.
pub fn detect_head_shoulders(
    swings: &SwingPoints,
    boundary: usize,
    params: &PatternParams,
) -> Vec<HeadShoulders> {
    let known = swings.known_at(boundary);
    let mut found = scan(&known.highs, PatternKind::HeadAndShoulders, params);
    found.extend(scan(&known.lows, PatternKind::Inverse, params));
    found
}

fn scan(points: &[SwingPoint], kind: PatternKind, params: &PatternParams) -> Vec<HeadShoulders> {
    points
        .windows(3)
        .filter_map(|w| {
            let (left, head, right) = (w[0], w[1], w[2]);
            let head_extreme = match kind {
                PatternKind::HeadAndShoulders => head.price > left.price && head.price > right.price,
                PatternKind::Inverse => head.price < left.price && head.price < right.price,
            };
            if !head_extreme || head.price == 0.0 {
                return None;
            }
            if (left.price - right.price).abs() / head.price.abs() >= params.tolerance {
                return None;
            }
            if let Some(cap) = params.max_shoulder_distance {
                if head.index - left.index > cap || right.index - head.index > cap {
                    return None;
                }
            }
            Some(HeadShoulders {
                kind,
                left,
                head,
                right,
            })
        })
        .collect()
}

/// Whether the right shoulder retraced into the 50%..61.8% zone of the move
/// that followed the head.
///
/// Bearish: the move runs from the head high down to the lowest low between
/// head and right shoulder; the right-shoulder high must sit in the zone
/// measured up from that trough. Bullish is mirrored on lows.
pub fn retracement_confirmed(candles: &[Candle], pattern: &HeadShoulders, boundary: usize) -> bool {
    let (h, r) = (pattern.head.index, pattern.right.index);
    if r > boundary || r >= candles.len() || h >= r {
        return false;
    }
    let span = &candles[h..=r];

    let (zone_lo, zone_hi) = match pattern.kind {
        PatternKind::HeadAndShoulders => {
            let trough = span.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
            if pattern.head.price.is_nan() || trough >= pattern.head.price {
                return false;
            }
            retracement_band(trough, pattern.head.price)
        }
        PatternKind::Inverse => {
            let peak = span.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
            if pattern.head.price.is_nan() || peak <= pattern.head.price {
                return false;
            }
            retracement_band(peak, pattern.head.price)
        }
    };

    (zone_lo..=zone_hi).contains(&pattern.right.price)
}

/// Whether a structure break in the pattern's direction happened after the
/// head and no later than `boundary`.
pub fn break_confirmed(pattern: &HeadShoulders, breaks: &[StructureBreak], boundary: usize) -> bool {
    let wanted = pattern.kind.confirming_break();
    breaks
        .iter()
        .any(|b| b.direction == wanted && b.index > pattern.head.index && b.index <= boundary)
}

/// Markers for the patterns that pass both corroborations, placed on the
/// right shoulder at its close.
pub fn confirmed_markers(
    candles: &[Candle],
    patterns: &[HeadShoulders],
    breaks: &[StructureBreak],
    boundary: usize,
) -> Vec<Marker> {
    patterns
        .iter()
        .filter(|p| break_confirmed(p, breaks, boundary))
        .filter(|p| retracement_confirmed(candles, p, boundary))
        .map(|p| {
            let bar = &candles[p.right.index];
            Marker::confirmed(p.right.index, bar.time, p.kind.side(), bar.close, p.kind.rule())
        })
        .collect()
}
