//! Head-and-shoulders reversals corroborated by market structure.
//!
//! Pipeline: swing points -> structure breaks -> head-and-shoulders and
//! inverse patterns -> markers for patterns that have both a confirming
//! break and a retracement into the 50%..61.8% zone.
//!
//! The default variant uses confirmed pivots and is safe for live charts.
//! The trailing variant tests only the bars before each candidate swing.
//! The centered variant credits a pivot before its right side has closed
//! and is only built directly, never through the factory.

use tracing::trace;

use crate::domain::{Candle, Marker};
use crate::patterns::{confirmed_markers, detect_head_shoulders, PatternParams};
use crate::structure::{detect_structure_breaks, find_swing_points, SwingMode};

use super::Strategy;

#[derive(Debug, Clone)]
pub struct StructureReversal {
    pub window: usize,
    pub mode: SwingMode,
    pub params: PatternParams,
    name: &'static str,
}

impl StructureReversal {
    pub fn new(window: usize, params: PatternParams) -> Self {
        Self::with_mode(window, SwingMode::Confirmed, params)
    }

    /// Variant on trailing-only swing detection.
    pub fn trailing(window: usize, params: PatternParams) -> Self {
        Self::with_mode(window, SwingMode::Trailing, params)
    }

    pub fn with_mode(window: usize, mode: SwingMode, params: PatternParams) -> Self {
        assert!(window >= 1, "swing window must be >= 1");
        assert!(
            params.tolerance > 0.0,
            "shoulder tolerance must be positive"
        );
        let name = match mode {
            SwingMode::Trailing => "structure_reversal_trailing",
            SwingMode::Confirmed => "structure_reversal",
            SwingMode::Centered => "structure_reversal_centered",
        };
        Self {
            window,
            mode,
            params,
            name,
        }
    }

    pub fn default_params() -> Self {
        Self::new(5, PatternParams::default())
    }
}

impl Strategy for StructureReversal {
    fn name(&self) -> &str {
        self.name
    }

    fn warmup_bars(&self) -> usize {
        // Three swings on one side, each needing a full window.
        match self.mode {
            SwingMode::Trailing => self.window.saturating_mul(3),
            SwingMode::Centered | SwingMode::Confirmed => self.window.saturating_mul(4),
        }
    }

    fn uses_future_bars(&self) -> bool {
        self.mode == SwingMode::Centered
    }

    fn markers(&self, candles: &[Candle]) -> Vec<Marker> {
        let Some(boundary) = candles.len().checked_sub(1) else {
            return Vec::new();
        };

        let swings = find_swing_points(candles, self.window, self.mode);
        let breaks = detect_structure_breaks(candles, &swings, boundary);
        let patterns = detect_head_shoulders(&swings, boundary, &self.params);
        trace!(
            strategy = self.name,
            highs = swings.highs.len(),
            lows = swings.lows.len(),
            breaks = breaks.len(),
            patterns = patterns.len(),
            "structure scan"
        );

        let mut markers = confirmed_markers(candles, &patterns, &breaks, boundary);
        markers.sort_by_key(|m| m.index);
        markers
    }
}
