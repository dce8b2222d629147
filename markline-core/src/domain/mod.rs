//! Domain types: candles and markers.

pub mod candle;
pub mod marker;

pub use candle::{closes, highs, lows, normalize_candles, Candle};
pub use marker::{Confidence, Marker, Position, Rule, Side};
