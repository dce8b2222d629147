//! Marker strategies: named detector pipelines behind one interface.
//!
//! Each strategy turns a candle slice into candidate markers. Strategies see
//! no position state; pairing opens with closes is the aggregator's job.
//! Several variants of the same idea coexist on purpose and are selected by
//! name from the chart config.

pub mod gaussian_cross;
pub mod structure_reversal;
pub mod supertrend_flip;

use crate::domain::{Candle, Marker};

/// Trait for marker strategies.
///
/// # Look-ahead guard
/// A marker at bar t may only depend on candles up to the last bar of the
/// slice it was computed from. Markers computed on a prefix of the candles
/// must also appear when the full sequence is evaluated.
pub trait Strategy: Send + Sync {
    /// Strategy name as used in configs (e.g. "gaussian_cross").
    fn name(&self) -> &str;

    /// Bars of history needed before the strategy can fire.
    fn warmup_bars(&self) -> usize;

    /// Candidate markers over the whole slice, ordered by index.
    fn markers(&self, candles: &[Candle]) -> Vec<Marker>;

    /// True when a marker at bar t reads bars after t. Such strategies are
    /// for batch analysis only and the factory refuses to build them.
    fn uses_future_bars(&self) -> bool {
        false
    }

    /// Bars before a marker's own bar that can change it. `None` when any
    /// earlier bar can, which makes the windowed recompute rerun the
    /// strategy over the whole history.
    fn memory(&self) -> Option<usize> {
        None
    }

    /// Candidate markers using only `candles[..=boundary]`.
    fn markers_up_to(&self, candles: &[Candle], boundary: usize) -> Vec<Marker> {
        if candles.is_empty() {
            return Vec::new();
        }
        let end = boundary.min(candles.len() - 1);
        self.markers(&candles[..=end])
    }
}

pub use crate::confluence::ConfluenceScorer;
pub use gaussian_cross::{baseline_crosses, GaussianCross};
pub use structure_reversal::StructureReversal;
pub use supertrend_flip::SupertrendFlip;
