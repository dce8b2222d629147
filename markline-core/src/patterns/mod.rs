//! Pattern recognizers built on swings and candle shapes.

pub mod candlestick;
pub mod head_shoulders;
pub mod levels;

pub use candlestick::{
    is_bearish_engulfing, is_bullish_engulfing, is_hammer, is_shooting_star, CandleShapes,
};
pub use head_shoulders::{
    break_confirmed, confirmed_markers, detect_head_shoulders, retracement_confirmed,
    HeadShoulders, PatternKind, PatternParams, SHOULDER_TOLERANCE,
};
pub use levels::{is_near, KeyLevels, NEAR_TOLERANCE};
