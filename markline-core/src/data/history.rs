//! History payload decoding.
//!
//! The chart history endpoint returns columnar OHLCV arrays, either wrapped
//! in an envelope
//!
//! ```json
//! { "code": "SUCCESS", "message": "", "data": { "t": [..], "o": [..], "h": [..],
//!   "l": [..], "c": [..], "v": [..], "s": "ok" } }
//! ```
//!
//! or as the bare `data` object. Null entries decode as 0. Columns of
//! different length are cut to the shortest one.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{normalize_candles, Candle};

use super::DataError;

/// Columnar bars as sent by the history endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HistoryPayload {
    pub t: Vec<Option<i64>>,
    pub o: Vec<Option<f64>>,
    pub h: Vec<Option<f64>>,
    pub l: Vec<Option<f64>>,
    pub c: Vec<Option<f64>>,
    pub v: Vec<Option<f64>>,
    pub s: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    pub data: Option<HistoryPayload>,
}

impl HistoryPayload {
    /// Rows that have every price column; volume may be absent entirely.
    fn row_count(&self) -> usize {
        let mut n = [self.t.len(), self.o.len(), self.h.len(), self.l.len(), self.c.len()]
            .into_iter()
            .min()
            .unwrap_or(0);
        if !self.v.is_empty() {
            n = n.min(self.v.len());
        }
        n
    }

    fn is_ragged(&self) -> bool {
        let n = self.t.len();
        [self.o.len(), self.h.len(), self.l.len(), self.c.len()]
            .into_iter()
            .any(|len| len != n)
            || (!self.v.is_empty() && self.v.len() != n)
    }

    /// Candles in payload order, not yet normalized. Rows without a time
    /// are skipped.
    pub fn candles(&self) -> Vec<Candle> {
        let n = self.row_count();
        if self.is_ragged() {
            warn!(
                t = self.t.len(),
                o = self.o.len(),
                h = self.h.len(),
                l = self.l.len(),
                c = self.c.len(),
                v = self.v.len(),
                kept = n,
                "ragged history columns, truncating"
            );
        }

        let num = |col: &[Option<f64>], i: usize| col.get(i).copied().flatten().unwrap_or(0.0);
        (0..n)
            .filter_map(|i| {
                let time = self.t[i]?;
                Some(Candle::new(
                    time,
                    num(&self.o, i),
                    num(&self.h, i),
                    num(&self.l, i),
                    num(&self.c, i),
                    num(&self.v, i),
                ))
            })
            .collect()
    }
}

/// Decode a history response body into normalized candles.
pub fn parse_history(body: &str) -> Result<Vec<Candle>, DataError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let payload = if value.get("data").is_some() {
        let resp: HistoryResponse = serde_json::from_value(value)?;
        resp.data.ok_or(DataError::Provider {
            code: resp.code,
            message: resp.message,
        })?
    } else {
        serde_json::from_value::<HistoryPayload>(value)?
    };

    let raw = payload.candles();
    if raw.is_empty() {
        return Err(DataError::EmptyHistory {
            status: payload.s.unwrap_or_default(),
        });
    }
    let candles = normalize_candles(raw);
    debug!(bars = candles.len(), "decoded history");
    Ok(candles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_envelope() {
        let body = r#"{
            "code": "SUCCESS", "message": "",
            "data": {
                "t": [1700000120, 1700000060],
                "o": [10.5, 10.0], "h": [11.0, 10.6], "l": [10.2, 9.9],
                "c": [10.8, 10.5], "v": [1200, 800], "s": "ok"
            },
            "paging": null, "status": "SUCCESS"
        }"#;
        let candles = parse_history(body).unwrap();
        assert_eq!(candles.len(), 2);
        // Sorted ascending.
        assert_eq!(candles[0].time, 1700000060);
        assert_eq!(candles[0].close, 10.5);
        assert_eq!(candles[1].volume, 1200.0);
    }

    #[test]
    fn decodes_bare_payload() {
        let body = r#"{"t":[60,120],"o":[1,2],"h":[1,2],"l":[1,2],"c":[1,2],"v":[5,6]}"#;
        let candles = parse_history(body).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].close, 2.0);
    }

    #[test]
    fn null_numbers_become_zero() {
        let body = r#"{"data":{"t":[60],"o":[null],"h":[2],"l":[1],"c":[1.5],"v":[null],"s":"ok"}}"#;
        let candles = parse_history(body).unwrap();
        assert_eq!(candles[0].open, 0.0);
        assert_eq!(candles[0].volume, 0.0);
    }

    #[test]
    fn ragged_columns_are_truncated() {
        let body = r#"{"data":{"t":[60,120,180],"o":[1,2,3],"h":[1,2],"l":[1,2,3],"c":[1,2,3],"v":[]}}"#;
        let candles = parse_history(body).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].volume, 0.0);
    }

    #[test]
    fn empty_data_is_an_error() {
        let body = r#"{"code":"SUCCESS","message":"","data":{"t":[],"o":[],"h":[],"l":[],"c":[],"v":[],"s":"no_data"}}"#;
        match parse_history(body) {
            Err(DataError::EmptyHistory { status }) => assert_eq!(status, "no_data"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_data_reports_provider_error() {
        let body = r#"{"code":"INVALID_SYMBOL","message":"symbol not found","data":null}"#;
        assert!(matches!(
            parse_history(body),
            Err(DataError::Provider { .. })
        ));
    }

    #[test]
    fn garbage_is_a_format_error() {
        assert!(matches!(
            parse_history("not json"),
            Err(DataError::ResponseFormat(_))
        ));
    }

    #[test]
    fn duplicate_times_keep_first() {
        let body = r#"{"t":[60,60,120],"o":[1,9,2],"h":[1,9,2],"l":[1,9,2],"c":[1,9,2],"v":[1,1,1]}"#;
        let candles = parse_history(body).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].close, 1.0);
    }
}
