//! Marker — a directional signal or close instruction pinned to one candle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a marker asks the reader to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Long,
    Short,
    CloseLong,
    CloseShort,
}

impl Side {
    pub fn is_open(&self) -> bool {
        matches!(self, Side::Long | Side::Short)
    }

    /// Placement hint for a chart overlay.
    pub fn above_bar(&self) -> bool {
        matches!(self, Side::Short | Side::CloseShort)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Side::Long => "LONG",
            Side::Short => "SHORT",
            Side::CloseLong => "CLOSE LONG",
            Side::CloseShort => "CLOSE SHORT",
        };
        f.write_str(s)
    }
}

/// Whether the marker sits on a closed bar or on the forming tail bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Confirmed,
    Provisional,
}

/// The detector rule that produced a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    HeadAndShoulders,
    InverseHeadAndShoulders,
    BaselineCrossUp,
    BaselineCrossDown,
    TrendFlipUp,
    TrendFlipDown,
    Confluence { score: u32 },
    PositionClose,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::HeadAndShoulders => f.write_str("head & shoulders"),
            Rule::InverseHeadAndShoulders => f.write_str("inverse head & shoulders"),
            Rule::BaselineCrossUp => f.write_str("baseline cross up"),
            Rule::BaselineCrossDown => f.write_str("baseline cross down"),
            Rule::TrendFlipUp => f.write_str("trend flip up"),
            Rule::TrendFlipDown => f.write_str("trend flip down"),
            Rule::Confluence { score } => write!(f, "confluence {score}"),
            Rule::PositionClose => f.write_str("position close"),
        }
    }
}

/// One emitted signal.
///
/// `index` is the position of the candle in the normalized series the marker
/// was computed from; `time` is that candle's time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub index: usize,
    pub time: i64,
    pub side: Side,
    pub confidence: Confidence,
    pub price: f64,
    #[serde(flatten)]
    pub rule: Rule,
}

impl Marker {
    pub fn confirmed(index: usize, time: i64, side: Side, price: f64, rule: Rule) -> Self {
        Self {
            index,
            time,
            side,
            confidence: Confidence::Confirmed,
            price,
            rule,
        }
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    /// Chart label, e.g. `SHORT (head & shoulders)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.side, self.rule)
    }
}

/// Aggregator-local position state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Position {
    #[default]
    Flat,
    Long,
    Short,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_combines_side_and_rule() {
        let m = Marker::confirmed(3, 180, Side::Short, 99.5, Rule::HeadAndShoulders);
        assert_eq!(m.label(), "SHORT (head & shoulders)");
        let m = Marker::confirmed(3, 180, Side::Long, 99.5, Rule::Confluence { score: 4 });
        assert_eq!(m.label(), "LONG (confluence 4)");
    }

    #[test]
    fn side_placement() {
        assert!(Side::Short.above_bar());
        assert!(Side::CloseShort.above_bar());
        assert!(!Side::Long.above_bar());
        assert!(Side::Long.is_open());
        assert!(!Side::CloseLong.is_open());
    }

    #[test]
    fn marker_serialization_roundtrip() {
        let m = Marker::confirmed(7, 420, Side::Long, 101.25, Rule::Confluence { score: 3 });
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"side\":\"LONG\""));
        assert!(json.contains("\"rule\":\"confluence\""));
        let back: Marker = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}
