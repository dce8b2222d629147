//! Support/resistance levels and proximity tests.
//!
//! Support is the most recent known swing low, resistance the most recent
//! known swing high. Retracement levels run from the newer of the two back
//! toward the older, so after a rally the 38.2% level sits below the high.

use serde::Serialize;

use crate::indicators::{fibonacci_levels, FibLevel};
use crate::structure::{SwingPoint, SwingPoints};

/// Relative distance within which a price counts as touching a level.
pub const NEAR_TOLERANCE: f64 = 0.005;

/// `|price - level| / level <= NEAR_TOLERANCE`. False for a zero or NaN level.
pub fn is_near(price: f64, level: f64) -> bool {
    if level == 0.0 || level.is_nan() || price.is_nan() {
        return false;
    }
    ((price - level) / level).abs() <= NEAR_TOLERANCE
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct KeyLevels {
    pub support: Option<SwingPoint>,
    pub resistance: Option<SwingPoint>,
}

impl KeyLevels {
    /// Latest swing low and high known at bar `boundary`.
    pub fn at(swings: &SwingPoints, boundary: usize) -> Self {
        let latest = |points: &[SwingPoint]| {
            points
                .iter()
                .rev()
                .find(|p| p.confirmed_at <= boundary)
                .copied()
        };
        Self {
            support: latest(&swings.lows),
            resistance: latest(&swings.highs),
        }
    }

    pub fn near_support(&self, price: f64) -> bool {
        self.support.is_some_and(|s| is_near(price, s.price))
    }

    pub fn near_resistance(&self, price: f64) -> bool {
        self.resistance.is_some_and(|r| is_near(price, r.price))
    }

    /// Retracement levels of the support/resistance pair, `None` until both exist.
    pub fn fib_levels(&self) -> Option<[FibLevel; 7]> {
        let (s, r) = (self.support?, self.resistance?);
        let (newer, older) = if r.index >= s.index { (r, s) } else { (s, r) };
        Some(fibonacci_levels(newer.price, older.price))
    }

    /// Whether `price` touches one of the interior retracement levels
    /// (23.6% through 78.6%).
    pub fn near_fib(&self, price: f64) -> bool {
        self.fib_levels().is_some_and(|levels| {
            levels[1..6].iter().any(|level| is_near(price, level.value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;
    use crate::structure::SwingKind;

    fn swing(index: usize, kind: SwingKind, price: f64, confirmed_at: usize) -> SwingPoint {
        SwingPoint {
            index,
            kind,
            price,
            confirmed_at,
        }
    }

    fn swings() -> SwingPoints {
        SwingPoints {
            highs: vec![swing(10, SwingKind::High, 120.0, 30)],
            lows: vec![
                swing(2, SwingKind::Low, 100.0, 22),
                swing(40, SwingKind::Low, 105.0, 60),
            ],
        }
    }

    #[test]
    fn proximity() {
        assert!(is_near(100.4, 100.0));
        assert!(is_near(99.5, 100.0));
        assert!(!is_near(100.6, 100.0));
        assert!(!is_near(1.0, 0.0));
    }

    #[test]
    fn levels_respect_confirmation() {
        let s = swings();
        let early = KeyLevels::at(&s, 25);
        assert_eq!(early.support.map(|p| p.index), Some(2));
        assert!(early.resistance.is_none());
        assert!(early.fib_levels().is_none());

        let later = KeyLevels::at(&s, 60);
        assert_eq!(later.support.map(|p| p.index), Some(40));
        assert_eq!(later.resistance.map(|p| p.index), Some(10));
    }

    #[test]
    fn fib_runs_from_newer_extreme() {
        let levels = KeyLevels::at(&swings(), 35);
        // Low at 2 (100) then high at 10 (120): levels fall from 120.
        let fib = levels.fib_levels().unwrap();
        assert_approx(fib[0].value, 120.0, 1e-12);
        assert_approx(fib[3].value, 110.0, 1e-12);
        assert!(levels.near_fib(110.3));
        assert!(!levels.near_fib(120.0));
    }

    #[test]
    fn support_and_resistance_touch() {
        let levels = KeyLevels::at(&swings(), 35);
        assert!(levels.near_support(100.2));
        assert!(levels.near_resistance(119.5));
        assert!(!levels.near_support(103.0));
    }
}
