//! Property tests for series and marker invariants.
//!
//! Uses proptest to verify:
//! 1. Length invariant: every indicator returns one value per input
//! 2. Short input: fewer values than the period gives an all-NaN series
//! 3. EMA seed equals the mean of the first `period` values
//! 4. MACD histogram is macd minus signal exactly where both are defined
//! 5. KDJ on a flat range stays finite
//! 6. Candle normalization: first-wins dedup, strictly ascending times
//! 7. Aggregator output: strictly ascending, unique times
//! 8. Live-safe swings: a peak is known only once the next bar closes

use proptest::prelude::*;
use std::collections::HashSet;

use markline_core::aggregator::SignalAggregator;
use markline_core::domain::{normalize_candles, Candle, Marker, Position, Rule, Side};
use markline_core::indicators::{ema, kdj, macd, rsi, sma};
use markline_core::structure::{find_swing_points, SwingMode};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_prices(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..500.0_f64, 0..max_len)
}

fn arb_side() -> impl Strategy<Value = Side> {
    prop_oneof![
        Just(Side::Long),
        Just(Side::Short),
        Just(Side::CloseLong),
        Just(Side::CloseShort),
    ]
}

fn flat_candles(n: usize) -> Vec<Candle> {
    (0..n)
        .map(|i| Candle::new(i as i64 * 60, 10.0, 10.0, 10.0, 10.0, 0.0))
        .collect()
}

// ── 1-3. Series shape ────────────────────────────────────────────────

proptest! {
    #[test]
    fn outputs_match_input_length(values in arb_prices(200), period in 1usize..50) {
        prop_assert_eq!(sma(&values, period).len(), values.len());
        prop_assert_eq!(ema(&values, period).len(), values.len());
        prop_assert_eq!(rsi(&values, period).len(), values.len());
    }

    #[test]
    fn short_input_is_all_nan(period in 2usize..60, len_frac in 0.0..1.0_f64) {
        let len = ((period as f64) * len_frac) as usize;
        let len = len.min(period - 1);
        let values: Vec<f64> = (0..len).map(|i| 100.0 + i as f64).collect();
        prop_assert!(sma(&values, period).iter().all(|v| v.is_nan()));
        prop_assert!(ema(&values, period).iter().all(|v| v.is_nan()));
        prop_assert!(rsi(&values, period).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn ema_seed_is_simple_mean(values in prop::collection::vec(1.0..500.0_f64, 1..120), period in 1usize..40) {
        prop_assume!(values.len() >= period);
        let out = ema(&values, period);
        let mean = values[..period].iter().sum::<f64>() / period as f64;
        prop_assert!((out[period - 1] - mean).abs() < 1e-9);
        prop_assert!(out[..period - 1].iter().all(|v| v.is_nan()));
    }
}

// ── 4-5. Multi-line oscillators ──────────────────────────────────────

proptest! {
    #[test]
    fn macd_histogram_identity(values in arb_prices(150)) {
        let out = macd(&values, 12, 26, 9);
        for i in 0..values.len() {
            let (m, s, h) = (out.macd[i], out.signal[i], out.histogram[i]);
            if m.is_nan() || s.is_nan() {
                prop_assert!(h.is_nan());
            } else {
                prop_assert!((h - (m - s)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn kdj_flat_range_is_finite(n in 1usize..100, price in 1.0..500.0_f64) {
        let flat = vec![price; n];
        let out = kdj(&flat, &flat, &flat, 9, 3);
        for i in 8..n {
            prop_assert!(out.k[i].is_finite() && out.d[i].is_finite() && out.j[i].is_finite());
            prop_assert!((out.k[i] - 50.0).abs() < 1e-9);
        }
    }
}

// ── 6. Normalization ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn normalize_dedups_first_wins(times in prop::collection::vec(0i64..50, 0..80)) {
        let candles: Vec<Candle> = times
            .iter()
            .enumerate()
            .map(|(seq, &t)| Candle::new(t, seq as f64, seq as f64, seq as f64, seq as f64, 0.0))
            .collect();
        let unique: HashSet<i64> = times.iter().copied().collect();

        let out = normalize_candles(candles);
        prop_assert_eq!(out.len(), unique.len());
        prop_assert!(out.windows(2).all(|w| w[0].time < w[1].time));
        for c in &out {
            let first = times.iter().position(|&t| t == c.time).unwrap();
            prop_assert_eq!(c.close, first as f64);
        }
    }
}

// ── 7. Aggregator ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn aggregator_output_is_time_ordered_and_unique(
        picks in prop::collection::vec((0usize..60, arb_side()), 0..40),
    ) {
        let candles = flat_candles(60);
        let candidates: Vec<Marker> = picks
            .iter()
            .map(|&(i, side)| Marker::confirmed(i, candles[i].time, side, 10.0, Rule::BaselineCrossUp))
            .collect();

        let mut agg = SignalAggregator::new();
        let out = agg.aggregate(&candles, candidates.clone());

        prop_assert!(out.windows(2).all(|w| w[0].time < w[1].time));
        for m in &out {
            let supplied = candidates.iter().any(|c| c == m);
            prop_assert!(supplied || m.rule == Rule::PositionClose);
        }
    }

    #[test]
    fn opposite_open_closes_first(i in 1usize..60) {
        let candles = flat_candles(60);
        let mut agg = SignalAggregator::with_position(Position::Long);
        let short = Marker::confirmed(i, candles[i].time, Side::Short, 10.0, Rule::TrendFlipDown);
        let out = agg.aggregate(&candles, vec![short]);
        prop_assert_eq!(out.len(), 2);
        prop_assert_eq!(out[0].side, Side::CloseLong);
        prop_assert_eq!(out[0].index, i - 1);
        prop_assert_eq!(out[1], short);
        prop_assert_eq!(agg.position(), Position::Short);
    }
}

// ── 8. Live-safe swings ──────────────────────────────────────────────

proptest! {
    #[test]
    fn peak_known_only_after_descending_bar(rise in 2usize..40) {
        let mut candles: Vec<Candle> = (0..=rise)
            .map(|i| {
                let p = 100.0 + i as f64;
                Candle::new(i as i64 * 60, p, p + 0.5, p - 0.5, p, 0.0)
            })
            .collect();
        let before = find_swing_points(&candles, 1, SwingMode::Confirmed);
        prop_assert!(before.highs.is_empty());

        let p = 100.0 + rise as f64 - 1.0;
        candles.push(Candle::new((rise as i64 + 1) * 60, p, p + 0.5, p - 0.5, p, 0.0));
        let after = find_swing_points(&candles, 1, SwingMode::Confirmed);
        prop_assert_eq!(after.highs.len(), 1);
        prop_assert_eq!(after.highs[0].index, rise);
        prop_assert_eq!(after.highs[0].confirmed_at, rise + 1);
    }
}
