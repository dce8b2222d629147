//! Fibonacci retracement levels between two prices.

use serde::Serialize;

/// The standard retracement ratios, 0 through 1.
pub const FIB_RATIOS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];

/// One retracement level: the ratio and the price it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FibLevel {
    pub ratio: f64,
    pub value: f64,
}

/// Map every ratio in [`FIB_RATIOS`] linearly from `start` toward `end`.
///
/// Values decrease from `start` when `start > end`, otherwise they increase.
/// Ratio 0 is always `start` and ratio 1 is always `end`.
pub fn fibonacci_levels(start: f64, end: f64) -> [FibLevel; 7] {
    let diff = (start - end).abs();
    let descending = start > end;
    FIB_RATIOS.map(|ratio| FibLevel {
        ratio,
        value: if descending {
            start - diff * ratio
        } else {
            start + diff * ratio
        },
    })
}

/// The 50%..61.8% retracement zone between `start` and `end`, as (low, high).
pub fn retracement_band(start: f64, end: f64) -> (f64, f64) {
    let levels = fibonacci_levels(start, end);
    let half = levels[3].value;
    let golden = levels[4].value;
    (half.min(golden), half.max(golden))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn ascending_levels() {
        let levels = fibonacci_levels(100.0, 200.0);
        assert_approx(levels[0].value, 100.0, DEFAULT_EPSILON);
        assert_approx(levels[1].value, 123.6, 1e-9);
        assert_approx(levels[3].value, 150.0, DEFAULT_EPSILON);
        assert_approx(levels[6].value, 200.0, DEFAULT_EPSILON);
        assert!(levels.windows(2).all(|w| w[0].value < w[1].value));
    }

    #[test]
    fn descending_levels() {
        let levels = fibonacci_levels(200.0, 100.0);
        assert_approx(levels[0].value, 200.0, DEFAULT_EPSILON);
        assert_approx(levels[4].value, 138.2, 1e-9);
        assert_approx(levels[6].value, 100.0, DEFAULT_EPSILON);
        assert!(levels.windows(2).all(|w| w[0].value > w[1].value));
    }

    #[test]
    fn band_is_ordered_either_direction() {
        let (lo, hi) = retracement_band(100.0, 200.0);
        assert_approx(lo, 150.0, DEFAULT_EPSILON);
        assert_approx(hi, 161.8, 1e-9);

        let (lo, hi) = retracement_band(200.0, 100.0);
        assert_approx(lo, 138.2, 1e-9);
        assert_approx(hi, 150.0, DEFAULT_EPSILON);
    }

    #[test]
    fn equal_endpoints_collapse() {
        let levels = fibonacci_levels(42.0, 42.0);
        assert!(levels.iter().all(|l| l.value == 42.0));
    }
}
