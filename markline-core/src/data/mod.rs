//! Data adapters at the edge of the core.
//!
//! Nothing here does network I/O. Callers fetch the history payload or
//! receive live-feed messages themselves and hand the bytes over; these
//! modules turn them into normalized candles.

pub mod csv_import;
pub mod history;
pub mod synthetic;
pub mod tick;

pub use csv_import::{read_csv, read_csv_path, write_csv};
pub use history::{parse_history, HistoryPayload, HistoryResponse};
pub use synthetic::{random_walk, SyntheticParams};
pub use tick::{CandleBuilder, OhlcMessage, Resolution, Tick};

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("history request failed: {code} {message}")]
    Provider { code: String, message: String },

    #[error("history response has no bars (status {status:?})")]
    EmptyHistory { status: String },

    #[error("response format changed: {0}")]
    ResponseFormat(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid resolution: {0:?}")]
    InvalidResolution(String),
}
