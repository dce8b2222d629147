//! Per-chart session: candles, computed series and markers for one chart.
//!
//! A session owns everything a chart instance needs, so several charts can
//! run side by side without shared state. Live updates go through
//! [`ChartSession::apply_update`], which appends or replaces the tail candle
//! and recomputes a trailing window only. [`ChartSession::recompute_full`]
//! is the reference the windowed path is tested against.
//!
//! How far back a component is recomputed depends on its memory: bounded
//! components rerun on a window, the rest on the whole history. Strategies
//! date some markers well before the bar that confirms them, so a window
//! cut at a fixed bar count would lose them.
//!
//! The API takes `&mut self` for every mutation and does no locking; a feed
//! thread and a reader thread must serialize access themselves.

use tracing::{debug, warn};

use crate::aggregator::SignalAggregator;
use crate::config::ChartConfig;
use crate::domain::{normalize_candles, Candle, Confidence, Marker, Position};
use crate::factory::FactoryError;
use crate::series::{Indicator, SeriesSet};
use crate::strategies::Strategy;

/// What `apply_update` did with a candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// Newer than the tail: pushed as a new bar.
    Appended,
    /// Same time as the tail: replaced it.
    Replaced,
    /// Older than the tail: ignored.
    Stale,
}

pub struct ChartSession {
    symbol: String,
    config: ChartConfig,
    candles: Vec<Candle>,
    indicators: Vec<Box<dyn Indicator>>,
    strategies: Vec<Box<dyn Strategy>>,
    aggregator: SignalAggregator,
    series: SeriesSet,
    /// Candidates per strategy, in strategy order, each ordered by index.
    candidates: Vec<Vec<Marker>>,
    /// All candidates merged and ordered by time.
    provisional: Vec<Marker>,
    markers: Vec<Marker>,
    forming: bool,
    /// Candle count the series and candidates were last computed for.
    computed: usize,
}

impl ChartSession {
    /// Build the components named in `config`.
    pub fn new(config: ChartConfig) -> Result<Self, FactoryError> {
        let indicators = config.build_indicators()?;
        let strategies = config.build_strategies()?;
        Ok(Self::with_components(config, indicators, strategies))
    }

    pub fn with_components(
        config: ChartConfig,
        indicators: Vec<Box<dyn Indicator>>,
        strategies: Vec<Box<dyn Strategy>>,
    ) -> Self {
        let candidates = vec![Vec::new(); strategies.len()];
        Self {
            symbol: config.symbol.clone(),
            config,
            candles: Vec::new(),
            indicators,
            strategies,
            candidates,
            aggregator: SignalAggregator::new(),
            series: SeriesSet::new(),
            provisional: Vec::new(),
            markers: Vec::new(),
            forming: false,
            computed: 0,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn series(&self) -> &SeriesSet {
        &self.series
    }

    /// Final, aggregated markers ordered by time.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Strategy candidates before aggregation.
    pub fn provisional(&self) -> &[Marker] {
        &self.provisional
    }

    pub fn position(&self) -> Position {
        self.aggregator.position()
    }

    pub fn is_forming(&self) -> bool {
        self.forming
    }

    /// Mark the tail candle as still forming. Markers on it turn provisional.
    pub fn set_forming(&mut self, forming: bool) {
        if self.forming != forming {
            self.forming = forming;
            self.aggregate();
        }
    }

    /// History bars any component needs before its output settles.
    pub fn warmup(&self) -> usize {
        let indicators = self.indicators.iter().map(|i| i.lookback());
        let strategies = self.strategies.iter().map(|s| s.warmup_bars());
        indicators.chain(strategies).max().unwrap_or(0)
    }

    /// Replace the history and recompute everything.
    pub fn load_history(&mut self, candles: Vec<Candle>) {
        self.candles = normalize_candles(candles);
        self.recompute_full();
    }

    /// Append or replace the tail candle, then recompute a trailing window.
    pub fn apply_update(&mut self, candle: Candle) -> UpdateKind {
        let kind = match self.candles.last() {
            None => UpdateKind::Appended,
            Some(last) if candle.time > last.time => UpdateKind::Appended,
            Some(last) if candle.time == last.time => UpdateKind::Replaced,
            Some(last) => {
                warn!(
                    symbol = %self.symbol,
                    time = candle.time,
                    tail = last.time,
                    "stale candle update ignored"
                );
                return UpdateKind::Stale;
            }
        };

        match kind {
            UpdateKind::Replaced => {
                let n = self.candles.len();
                self.candles[n - 1] = candle;
            }
            _ => self.candles.push(candle),
        }
        self.recompute_tail(self.candles.len() - 1);
        kind
    }

    /// Recompute every series and marker from the whole history.
    pub fn recompute_full(&mut self) {
        let mut series = SeriesSet::new();
        for ind in &self.indicators {
            series.insert(ind.name(), ind.compute(&self.candles));
        }
        self.series = series;

        self.candidates = self
            .strategies
            .iter()
            .map(|s| s.markers(&self.candles))
            .collect();
        self.merge_candidates();
        self.computed = self.candles.len();

        self.aggregate();
        debug!(
            symbol = %self.symbol,
            bars = self.candles.len(),
            candidates = self.provisional.len(),
            markers = self.markers.len(),
            "full recompute"
        );
    }

    /// Recompute after the candles from `changed` on were replaced or added.
    ///
    /// The cut is `changed`, pulled back to `n - tail_window` at most.
    /// An indicator with bounded memory reruns over the bars from
    /// `cut - memory` and its series is spliced from `changed`; one without
    /// reruns over the whole history. A strategy with bounded memory keeps
    /// its candidates before the cut and takes the window's from the cut on;
    /// any other strategy reruns over the whole history, since its markers
    /// may be dated long before the bar that produced them.
    pub fn recompute_tail(&mut self, changed: usize) {
        let n = self.candles.len();
        if changed >= n || changed > self.computed {
            self.recompute_full();
            return;
        }
        let cut = changed.min(n.saturating_sub(self.config.tail_window));
        let mut windowed = 0usize;

        for ind in &self.indicators {
            match ind.memory().map(|m| cut.saturating_sub(m)) {
                Some(start) if start > 0 => {
                    let tail = ind.compute(&self.candles[start..]);
                    self.series.splice_tail(ind.name(), changed, &tail[changed - start..]);
                    windowed += 1;
                }
                _ => self.series.insert(ind.name(), ind.compute(&self.candles)),
            }
        }

        for (strategy, candidates) in self.strategies.iter().zip(self.candidates.iter_mut()) {
            match strategy.memory().map(|m| cut.saturating_sub(m)) {
                Some(start) if start > 0 => {
                    candidates.retain(|m| m.index < cut);
                    candidates.extend(
                        strategy
                            .markers(&self.candles[start..])
                            .into_iter()
                            .map(|mut m| {
                                m.index += start;
                                m
                            })
                            .filter(|m| m.index >= cut),
                    );
                    windowed += 1;
                }
                _ => *candidates = strategy.markers(&self.candles),
            }
        }

        self.merge_candidates();
        self.computed = n;

        self.aggregate();
        debug!(
            symbol = %self.symbol,
            bars = n,
            changed,
            cut,
            windowed,
            markers = self.markers.len(),
            "tail recompute"
        );
    }

    /// Last value of every series, NaN as `None`, in series order.
    pub fn latest_values(&self) -> Vec<(String, Option<f64>)> {
        self.series
            .names()
            .map(|name| (name.to_string(), self.series.latest(name)))
            .collect()
    }

    /// Flatten the per-strategy candidates in strategy order, then sort by
    /// time. The sort is stable, so equal times keep strategy order.
    fn merge_candidates(&mut self) {
        let mut provisional: Vec<Marker> = self.candidates.iter().flatten().copied().collect();
        provisional.sort_by_key(|m| m.time);
        self.provisional = provisional;
    }

    /// Re-run the aggregator over all candidates from a flat position.
    /// Candidates on a forming tail bar enter as provisional, and so do the
    /// closes they trigger.
    fn aggregate(&mut self) {
        let tail = self.candles.len().checked_sub(1);
        let forming = self.forming;
        let candidates = self
            .provisional
            .iter()
            .map(|m| {
                let confidence = if forming && Some(m.index) == tail {
                    Confidence::Provisional
                } else {
                    Confidence::Confirmed
                };
                m.with_confidence(confidence)
            })
            .collect();

        self.aggregator.reset();
        self.markers = self.aggregator.aggregate(&self.candles, candidates);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComponentConfig;
    use crate::domain::{Rule, Side};
    use crate::indicators::{make_candles, Sma};

    /// Long on every bar whose close is a new high of the slice so far.
    struct NewHigh;

    impl Strategy for NewHigh {
        fn name(&self) -> &str {
            "new_high"
        }

        fn warmup_bars(&self) -> usize {
            1
        }

        fn markers(&self, candles: &[Candle]) -> Vec<Marker> {
            let mut best = f64::NEG_INFINITY;
            let mut out = Vec::new();
            for (i, c) in candles.iter().enumerate() {
                if i > 0 && c.close > best {
                    out.push(Marker::confirmed(i, c.time, Side::Long, c.close, Rule::BaselineCrossUp));
                }
                best = best.max(c.close);
            }
            out
        }
    }

    /// Long on every bar that closes above the bar before it.
    struct UpClose;

    impl Strategy for UpClose {
        fn name(&self) -> &str {
            "up_close"
        }

        fn warmup_bars(&self) -> usize {
            1
        }

        fn markers(&self, candles: &[Candle]) -> Vec<Marker> {
            candles
                .windows(2)
                .enumerate()
                .filter(|(_, w)| w[1].close > w[0].close)
                .map(|(i, w)| Marker::confirmed(i + 1, w[1].time, Side::Long, w[1].close, Rule::BaselineCrossUp))
                .collect()
        }

        fn memory(&self) -> Option<usize> {
            Some(1)
        }
    }

    /// Short dated on the highest close since the last marker, once a later
    /// close has fallen `drop` below it.
    struct PeakAfterDrop {
        drop: f64,
    }

    impl Strategy for PeakAfterDrop {
        fn name(&self) -> &str {
            "peak_after_drop"
        }

        fn warmup_bars(&self) -> usize {
            1
        }

        fn markers(&self, candles: &[Candle]) -> Vec<Marker> {
            let mut out = Vec::new();
            let mut peak: Option<usize> = None;
            for (i, c) in candles.iter().enumerate() {
                let Some(p) = peak else {
                    peak = Some(i);
                    continue;
                };
                if c.close > candles[p].close {
                    peak = Some(i);
                } else if candles[p].close - c.close >= self.drop {
                    let bar = &candles[p];
                    out.push(Marker::confirmed(p, bar.time, Side::Short, bar.close, Rule::HeadAndShoulders));
                    peak = None;
                }
            }
            out
        }
    }

    fn session(tail_window: usize) -> ChartSession {
        let config = ChartConfig {
            symbol: "TEST".into(),
            tail_window,
            indicators: vec![ComponentConfig::new("sma").with_param("period", 3.0)],
            strategies: Vec::new(),
            ..ChartConfig::default()
        };
        ChartSession::with_components(config, vec![Box::new(Sma::new(3))], vec![Box::new(NewHigh)])
    }

    #[test]
    fn default_config_session_builds() {
        let s = ChartSession::new(ChartConfig::default()).unwrap();
        assert!(s.warmup() >= 59);
    }

    #[test]
    fn update_kinds() {
        let mut s = session(10);
        s.load_history(make_candles(&[1.0, 2.0, 3.0]));
        let t = s.candles()[2].time;

        assert_eq!(s.apply_update(Candle::new(t, 3.0, 5.0, 3.0, 5.0, 0.0)), UpdateKind::Replaced);
        assert_eq!(s.candles().len(), 3);
        assert_eq!(s.candles()[2].close, 5.0);

        assert_eq!(s.apply_update(Candle::new(t + 60, 5.0, 6.0, 5.0, 6.0, 0.0)), UpdateKind::Appended);
        assert_eq!(s.candles().len(), 4);

        assert_eq!(s.apply_update(Candle::new(t - 60, 1.0, 1.0, 1.0, 1.0, 0.0)), UpdateKind::Stale);
        assert_eq!(s.candles().len(), 4);
    }

    #[test]
    fn first_update_on_empty_session_appends() {
        let mut s = session(10);
        assert_eq!(s.apply_update(Candle::new(60, 1.0, 1.0, 1.0, 1.0, 0.0)), UpdateKind::Appended);
        assert_eq!(s.series().get_series("sma_3").unwrap().len(), 1);
    }

    #[test]
    fn series_stay_aligned_after_updates() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.3).sin()).collect();
        let mut s = session(5);
        s.load_history(make_candles(&closes[..30]));
        for c in make_candles(&closes)[30..].iter() {
            s.apply_update(*c);
        }
        let sma = s.series().get_series("sma_3").unwrap();
        assert_eq!(sma.len(), 40);
        let expected = (closes[37] + closes[38] + closes[39]) / 3.0;
        assert!((sma[39] - expected).abs() < 1e-12);
    }

    #[test]
    fn forming_tail_markers_are_provisional() {
        let mut s = session(10);
        s.load_history(make_candles(&[1.0, 2.0, 3.0, 4.0]));
        s.set_forming(true);
        let last = *s.markers().last().unwrap();
        assert_eq!(last.index, 3);
        assert_eq!(last.confidence, Confidence::Provisional);
        assert!(s.markers()[..s.markers().len() - 1]
            .iter()
            .all(|m| m.confidence == Confidence::Confirmed));

        s.set_forming(false);
        assert!(s.markers().iter().all(|m| m.confidence == Confidence::Confirmed));
    }

    fn sessions_with(tail_window: usize, strategy: fn() -> Box<dyn Strategy>) -> (ChartSession, ChartSession) {
        let config = ChartConfig {
            tail_window,
            strategies: Vec::new(),
            ..ChartConfig::default()
        };
        let build = || ChartSession::with_components(config.clone(), vec![Box::new(Sma::new(3))], vec![strategy()]);
        (build(), build())
    }

    fn zigzag(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + 6.0 * (i as f64 * 0.4).sin() + (i % 3) as f64)
            .collect()
    }

    #[test]
    fn bounded_strategy_recomputes_on_a_window() {
        let closes = zigzag(60);
        let candles = make_candles(&closes);
        let (mut live, mut full) = sessions_with(2, || Box::new(UpClose));
        full.load_history(candles.clone());
        live.load_history(candles[..20].to_vec());
        for c in &candles[20..] {
            live.apply_update(*c);
        }
        assert!(!full.markers().is_empty());
        assert_eq!(live.provisional(), full.provisional());
        assert_eq!(live.markers(), full.markers());
    }

    #[test]
    fn backdated_candidates_survive_a_small_window() {
        // Peaks are dated several bars before the drop that reveals them.
        let closes = zigzag(80);
        let candles = make_candles(&closes);
        for tail_window in [1, 2, 5] {
            let (mut live, mut full) = sessions_with(tail_window, || Box::new(PeakAfterDrop { drop: 4.0 }));
            full.load_history(candles.clone());
            live.load_history(candles[..10].to_vec());
            for c in &candles[10..] {
                live.apply_update(*c);
            }
            assert!(!full.markers().is_empty());
            assert_eq!(live.markers(), full.markers(), "tail_window {tail_window}");
        }
    }

    #[test]
    fn latest_values_map_nan_to_none() {
        let mut s = session(10);
        s.load_history(make_candles(&[1.0, 2.0]));
        assert_eq!(s.latest_values(), vec![("sma_3".to_string(), None)]);
        s.apply_update(Candle::new(s.candles()[1].time + 60, 3.0, 3.0, 3.0, 3.0, 0.0));
        assert_eq!(s.latest_values(), vec![("sma_3".to_string(), Some(2.0))]);
    }
}
