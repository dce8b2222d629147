//! CSV import and export of candles.
//!
//! Header: `time,open,high,low,close[,volume]`, time in Unix seconds.
//! Missing volume reads as 0.

use std::io::{Read, Write};
use std::path::Path;

use serde::Deserialize;

use crate::domain::{normalize_candles, Candle};

use super::DataError;

#[derive(Debug, Deserialize)]
struct CsvRow {
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

/// Read normalized candles from any CSV source.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Candle>, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut candles = Vec::new();
    for row in rdr.deserialize() {
        let row: CsvRow = row?;
        candles.push(Candle::new(
            row.time,
            row.open,
            row.high,
            row.low,
            row.close,
            row.volume.unwrap_or(0.0),
        ));
    }
    Ok(normalize_candles(candles))
}

pub fn read_csv_path(path: &Path) -> Result<Vec<Candle>, DataError> {
    let file = std::fs::File::open(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_csv(file)
}

/// Write candles with the same header `read_csv` expects.
pub fn write_csv<W: Write>(writer: W, candles: &[Candle]) -> Result<(), DataError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for c in candles {
        wtr.serialize(c)?;
    }
    wtr.flush().map_err(|source| DataError::Io {
        path: "<writer>".into(),
        source,
    })?;
    Ok(())
}
