//! Signal aggregator: merges candidate markers into one marker sequence.
//!
//! The aggregator owns a single position (flat, long, short). An open marker
//! against the current position first emits the matching close marker on
//! the previous bar, then the open marker itself. A trigger on the first bar
//! has no bar to close on: the position still flips but no close is emitted. Repeated opens on the held side are emitted as is and do
//! not change the position. Close markers from strategies flatten a matching
//! position.
//!
//! After all markers are consumed the output is stable-sorted by time and
//! only the first marker at each time survives. Candidates that share a time
//! are consumed in the order they were supplied.

use tracing::debug;

use crate::domain::{Candle, Marker, Position, Rule, Side};

#[derive(Debug, Clone, Default)]
pub struct SignalAggregator {
    position: Position,
}

impl SignalAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a held position.
    pub fn with_position(position: Position) -> Self {
        Self { position }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Forget the held position. Required before a recompute from scratch.
    pub fn reset(&mut self) {
        self.position = Position::Flat;
    }

    /// Consume one candidate, appending the resulting markers to `out`.
    pub fn push(&mut self, candles: &[Candle], marker: Marker, out: &mut Vec<Marker>) {
        match (marker.side, self.position) {
            (Side::Long, Position::Short) => {
                out.extend(close_before(candles, &marker, Side::CloseShort));
                self.position = Position::Long;
            }
            (Side::Short, Position::Long) => {
                out.extend(close_before(candles, &marker, Side::CloseLong));
                self.position = Position::Short;
            }
            (Side::Long, _) => self.position = Position::Long,
            (Side::Short, _) => self.position = Position::Short,
            (Side::CloseLong, Position::Long) | (Side::CloseShort, Position::Short) => {
                self.position = Position::Flat;
            }
            (Side::CloseLong | Side::CloseShort, _) => {}
        }
        out.push(marker);
    }

    /// Aggregate a batch of candidates from any number of strategies.
    ///
    /// Candidates are consumed in time order; the held position carries over
    /// from earlier calls until [`reset`](Self::reset).
    pub fn aggregate(&mut self, candles: &[Candle], mut candidates: Vec<Marker>) -> Vec<Marker> {
        candidates.sort_by_key(|m| m.time);
        let supplied = candidates.len();

        let mut out = Vec::with_capacity(supplied + supplied / 2);
        for marker in candidates {
            self.push(candles, marker, &mut out);
        }
        let merged = finalize(out);

        debug!(
            candidates = supplied,
            markers = merged.len(),
            position = ?self.position,
            "aggregated markers"
        );
        merged
    }
}

/// Stable sort by time, keep the first marker at each time.
pub fn finalize(mut markers: Vec<Marker>) -> Vec<Marker> {
    markers.sort_by_key(|m| m.time);
    markers.dedup_by_key(|m| m.time);
    markers
}

/// Close marker on the bar before the trigger, `None` on the first bar.
fn close_before(candles: &[Candle], trigger: &Marker, side: Side) -> Option<Marker> {
    let index = trigger.index.checked_sub(1)?;
    let bar = candles.get(index)?;
    Some(Marker {
        index,
        time: bar.time,
        side,
        confidence: trigger.confidence,
        price: bar.close,
        rule: Rule::PositionClose,
    })
}
