//! Seeded random-walk candles for demos, replay and benchmarks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::Candle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticParams {
    pub seed: u64,
    pub start_time: i64,
    /// Seconds between bars.
    pub step: i64,
    pub start_price: f64,
    /// Largest relative close-to-close move per bar.
    pub volatility: f64,
}

impl Default for SyntheticParams {
    fn default() -> Self {
        Self {
            seed: 42,
            start_time: 1_700_000_000,
            step: 60,
            start_price: 100.0,
            volatility: 0.01,
        }
    }
}

/// `n` candles of a bounded random walk. Same params, same candles.
pub fn random_walk(n: usize, params: &SyntheticParams) -> Vec<Candle> {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let vol = params.volatility.abs();
    let mut prev_close = params.start_price;

    (0..n)
        .map(|i| {
            let open = prev_close;
            let close = (open * (1.0 + rng.gen_range(-vol..=vol))).max(0.01);
            let wick_up = open.max(close) * rng.gen_range(0.0..=vol);
            let wick_down = open.min(close) * rng.gen_range(0.0..=vol);
            let volume = rng.gen_range(100.0..10_000.0_f64).round();
            prev_close = close;
            Candle::new(
                params.start_time + i as i64 * params.step,
                open,
                open.max(close) + wick_up,
                (open.min(close) - wick_down).max(0.0),
                close,
                volume,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_a_seed() {
        let p = SyntheticParams::default();
        assert_eq!(random_walk(50, &p), random_walk(50, &p));
        let other = SyntheticParams { seed: 7, ..p.clone() };
        assert_ne!(random_walk(50, &p), random_walk(50, &other));
    }

    #[test]
    fn candles_are_sane_and_ordered() {
        let candles = random_walk(500, &SyntheticParams::default());
        assert_eq!(candles.len(), 500);
        assert!(candles.iter().all(|c| c.is_sane()));
        assert!(candles.windows(2).all(|w| w[0].time < w[1].time));
        assert!(candles.windows(2).all(|w| w[1].open == w[0].close));
    }

    #[test]
    fn zero_bars() {
        assert!(random_walk(0, &SyntheticParams::default()).is_empty());
    }
}
