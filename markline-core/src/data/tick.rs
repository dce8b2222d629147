//! Live feed messages folded into candles.
//!
//! Two message kinds arrive per subscribed symbol: trade ticks and whole
//! OHLC bars. Both are filtered by symbol and turned into the single new or
//! updated tail candle that `ChartSession::apply_update` consumes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Candle;

use super::DataError;

/// Bar size of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    Minutes(u32),
    Day,
}

impl Resolution {
    /// Accepts minute counts ("1", "5", "60") and "D" / "1D".
    pub fn parse(s: &str) -> Result<Self, DataError> {
        let s = s.trim();
        match s {
            "D" | "1D" | "d" | "1d" => Ok(Resolution::Day),
            _ => match s.parse::<u32>() {
                Ok(m) if m > 0 => Ok(Resolution::Minutes(m)),
                _ => Err(DataError::InvalidResolution(s.to_string())),
            },
        }
    }

    pub fn seconds(&self) -> i64 {
        match self {
            Resolution::Minutes(m) => i64::from(*m) * 60,
            Resolution::Day => 86_400,
        }
    }

    /// Start of the bucket holding `time`.
    pub fn bucket_start(&self, time: i64) -> i64 {
        time - time.rem_euclid(self.seconds())
    }
}

impl FromStr for Resolution {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Minutes(m) => write!(f, "{m}"),
            Resolution::Day => f.write_str("1D"),
        }
    }
}

/// One trade print.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: String,
    #[serde(alias = "sendingTime")]
    pub time: i64,
    #[serde(alias = "matchPrice")]
    pub price: f64,
    #[serde(default, alias = "matchQtty")]
    pub volume: f64,
}

impl Tick {
    pub fn from_json(payload: &str) -> Result<Self, DataError> {
        Ok(serde_json::from_str(payload)?)
    }
}

/// A whole bar pushed by the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcMessage {
    pub symbol: String,
    #[serde(default)]
    pub resolution: Option<String>,
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl OhlcMessage {
    pub fn from_json(payload: &str) -> Result<Self, DataError> {
        Ok(serde_json::from_str(payload)?)
    }

    pub fn to_candle(&self) -> Candle {
        Candle::new(self.time, self.open, self.high, self.low, self.close, self.volume)
    }
}

/// Folds feed messages for one symbol into the forming candle.
#[derive(Debug, Clone)]
pub struct CandleBuilder {
    symbol: String,
    resolution: Resolution,
    current: Option<Candle>,
}

impl CandleBuilder {
    pub fn new(symbol: impl Into<String>, resolution: Resolution) -> Self {
        Self {
            symbol: symbol.into(),
            resolution,
            current: None,
        }
    }

    /// Continue from the last candle of the loaded history.
    pub fn with_last(mut self, last: Candle) -> Self {
        self.current = Some(last);
        self
    }

    pub fn current(&self) -> Option<&Candle> {
        self.current.as_ref()
    }

    /// Fold a trade into the bucket candle. Returns the new or updated
    /// candle, or `None` for another symbol or a tick older than the bucket.
    pub fn push_tick(&mut self, tick: &Tick) -> Option<Candle> {
        if tick.symbol != self.symbol || !tick.price.is_finite() {
            return None;
        }
        let bucket = self.resolution.bucket_start(tick.time);

        let candle = match self.current {
            Some(mut c) if c.time == bucket => {
                c.high = c.high.max(tick.price);
                c.low = c.low.min(tick.price);
                c.close = tick.price;
                c.volume += tick.volume;
                c
            }
            Some(c) if c.time > bucket => {
                debug!(symbol = %self.symbol, tick_time = tick.time, bar_time = c.time, "late tick ignored");
                return None;
            }
            _ => Candle::new(bucket, tick.price, tick.price, tick.price, tick.price, tick.volume),
        };
        self.current = Some(candle);
        Some(candle)
    }

    /// Take a whole bar from the feed. Bars for another symbol or older
    /// than the current one are ignored.
    pub fn push_ohlc(&mut self, msg: &OhlcMessage) -> Option<Candle> {
        if msg.symbol != self.symbol {
            return None;
        }
        if self.current.is_some_and(|c| c.time > msg.time) {
            return None;
        }
        let candle = msg.to_candle();
        self.current = Some(candle);
        Some(candle)
    }
}
