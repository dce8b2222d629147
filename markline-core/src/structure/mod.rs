//! Market structure: swing points and breaks of structure.
//!
//! Swing detection comes in a look-ahead form for batch analysis and in
//! live-safe forms. Anything that feeds live markers must use a mode whose
//! swings carry `confirmed_at <= boundary`.

pub mod bos;
pub mod swing;

pub use bos::{detect_structure_breaks, BreakDirection, StructureBreak, BREAK_TOLERANCE};
pub use swing::{find_swing_points, SwingKind, SwingMode, SwingPoint, SwingPoints};
