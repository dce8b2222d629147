//! Markline Core — indicator math, structure detection and chart markers.
//!
//! This crate turns a candle history into what a chart draws:
//! - Domain types (candles, markers, sides, positions)
//! - Stateless indicator functions and named `Indicator` instances
//! - Swing points, structure breaks and pattern recognizers
//! - Named marker strategies and the confluence scorer
//! - The signal aggregator that pairs opens with closes
//! - A per-chart session with full and windowed recompute
//! - Config, component factory and data adapters (history, CSV, live ticks)
//!
//! Nothing here does network I/O or blocks.

pub mod aggregator;
pub mod config;
pub mod confluence;
pub mod data;
pub mod domain;
pub mod factory;
pub mod indicators;
pub mod patterns;
pub mod series;
pub mod session;
pub mod strategies;
pub mod structure;

pub use aggregator::SignalAggregator;
pub use config::{ChartConfig, ComponentConfig, ConfigError};
pub use domain::{Candle, Confidence, Marker, Position, Rule, Side};
pub use series::{Indicator, SeriesSet};
pub use session::{ChartSession, UpdateKind};
pub use strategies::Strategy;
