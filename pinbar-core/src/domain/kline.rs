//! Exchange kline rows and their conversion into candles.
//!
//! A kline row carries twelve fields in a fixed order:
//! open time, open, high, low, close, volume, close time, quote volume,
//! trade count, taker-buy base volume, taker-buy quote volume, ignored.
//! Rows arrive either as JSON arrays (numbers or numeric strings) or as
//! headerless CSV lines.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::candle::Candle;

const FIELD_NAMES: [&str; KlineRecord::FIELD_COUNT] = [
    "open_time",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "close_time",
    "quote_volume",
    "trade_count",
    "taker_buy_base_volume",
    "taker_buy_quote_volume",
    "ignore",
];

#[derive(Debug, Error)]
pub enum KlineError {
    #[error("Kline row has {found} fields, expected {expected}")]
    FieldCount { expected: usize, found: usize },

    #[error("Kline field `{field}` has unparsable value `{value}`")]
    InvalidField { field: &'static str, value: String },

    #[error("Kline open time {0} is out of range")]
    InvalidTimestamp(i64),

    #[error("Kline JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Kline CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One kline row, fully parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KlineRecord {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: i64,
    pub quote_volume: f64,
    pub trade_count: u64,
    pub taker_buy_base_volume: f64,
    pub taker_buy_quote_volume: f64,
}

impl KlineRecord {
    pub const FIELD_COUNT: usize = 12;

    /// Parse a row given as its textual fields.
    ///
    /// Only the field count and the open time are hard requirements. An
    /// unparsable numeric cell becomes NaN, so the candle built from the row
    /// fails `Candle::is_valid` and is skipped by the analysis layer.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Result<Self, KlineError> {
        if fields.len() != Self::FIELD_COUNT {
            return Err(KlineError::FieldCount {
                expected: Self::FIELD_COUNT,
                found: fields.len(),
            });
        }
        let text = |i: usize| fields[i].as_ref().trim();

        let open_time = parse_int(text(0), FIELD_NAMES[0])?;
        Ok(Self {
            open_time,
            open: coerce_float(text(1)),
            high: coerce_float(text(2)),
            low: coerce_float(text(3)),
            close: coerce_float(text(4)),
            volume: coerce_float(text(5)),
            close_time: parse_int(text(6), FIELD_NAMES[6]).unwrap_or(open_time),
            quote_volume: coerce_float(text(7)),
            trade_count: parse_int(text(8), FIELD_NAMES[8]).map_or(0, |n| n.max(0) as u64),
            taker_buy_base_volume: coerce_float(text(9)),
            taker_buy_quote_volume: coerce_float(text(10)),
        })
    }

    /// Parse a row from the exchange REST shape: a JSON array of numbers and strings.
    pub fn from_json_row(row: &[Value]) -> Result<Self, KlineError> {
        let fields: Vec<String> = row
            .iter()
            .map(|value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        Self::from_fields(&fields)
    }

    pub fn from_csv_record(record: &csv::StringRecord) -> Result<Self, KlineError> {
        let fields: Vec<&str> = record.iter().collect();
        Self::from_fields(&fields)
    }

    /// Convert into a candle keyed by open time.
    ///
    /// Price sanity is not checked here; invalid candles are kept so the
    /// analysis layer can skip them index by index.
    pub fn to_candle(&self) -> Result<Candle, KlineError> {
        let timestamp: DateTime<Utc> = Utc
            .timestamp_millis_opt(self.open_time)
            .single()
            .ok_or(KlineError::InvalidTimestamp(self.open_time))?;
        Ok(Candle::new(
            timestamp,
            self.open,
            self.high,
            self.low,
            self.close,
            Some(self.volume),
        ))
    }
}

fn coerce_float(text: &str) -> f64 {
    text.parse::<f64>().unwrap_or(f64::NAN)
}

fn parse_int(text: &str, field: &'static str) -> Result<i64, KlineError> {
    let invalid = || KlineError::InvalidField {
        field,
        value: text.to_string(),
    };
    if let Ok(value) = text.parse::<i64>() {
        return Ok(value);
    }
    // Some feeds serialize integer fields as floats ("1700000000000.0").
    let value = text.parse::<f64>().map_err(|_| invalid())?;
    if !value.is_finite() || value.fract() != 0.0 || value.abs() >= 9.0e18 {
        return Err(invalid());
    }
    Ok(value as i64)
}

/// Parse a JSON array of kline rows into candles.
pub fn parse_klines_json(content: &str) -> Result<Vec<Candle>, KlineError> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(content)?;
    rows.iter()
        .map(|row| KlineRecord::from_json_row(row)?.to_candle())
        .collect()
}

/// Parse headerless CSV kline rows into candles.
pub fn parse_klines_csv(content: &str) -> Result<Vec<Candle>, KlineError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut candles = Vec::new();
    for record in reader.records() {
        let record = record?;
        candles.push(KlineRecord::from_csv_record(&record)?.to_candle()?);
    }
    Ok(candles)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = r#"[1700000000000, "100.0", "105.0", "98.0", "103.0", "1500.5",
        1700000059999, "150000.0", 420, "700.0", "70000.0", "0"]"#;

    #[test]
    fn parses_rest_row_with_mixed_types() {
        let row: Vec<Value> = serde_json::from_str(ROW).unwrap();
        let record = KlineRecord::from_json_row(&row).unwrap();
        assert_eq!(record.open_time, 1_700_000_000_000);
        assert_eq!(record.high, 105.0);
        assert_eq!(record.trade_count, 420);

        let candle = record.to_candle().unwrap();
        assert_eq!(candle.timestamp.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(candle.volume, Some(1500.5));
        assert!(candle.is_valid());
    }

    #[test]
    fn rejects_wrong_field_count() {
        let row: Vec<Value> = serde_json::from_str(r#"[1, "1", "1", "1", "1"]"#).unwrap();
        let err = KlineRecord::from_json_row(&row).unwrap_err();
        assert!(matches!(err, KlineError::FieldCount { expected: 12, found: 5 }));
    }

    #[test]
    fn garbage_price_becomes_invalid_candle() {
        let row: Vec<Value> = serde_json::from_str(
            r#"[1, "abc", "1", "1", "1", null, 2, "1", "x", "1", "1", "0"]"#,
        )
        .unwrap();
        let record = KlineRecord::from_json_row(&row).unwrap();
        assert!(record.open.is_nan());
        assert!(record.volume.is_nan());
        assert_eq!(record.trade_count, 0);
        assert!(!record.to_candle().unwrap().is_valid());
    }

    #[test]
    fn one_bad_cell_keeps_the_other_rows() {
        let rows: Vec<String> = (0..30)
            .map(|i| {
                let open = if i == 12 { r#""abc""# } else { r#""100.0""# };
                let t = 1_700_000_000_000_i64 + i * 60_000;
                format!(
                    r#"[{t},{open},"105.0","98.0","103.0","10",{},"1000",5,"4","400","0"]"#,
                    t + 59_999
                )
            })
            .collect();
        let candles = parse_klines_json(&format!("[{}]", rows.join(","))).unwrap();
        assert_eq!(candles.len(), 30);
        assert!(!candles[12].is_valid());
        assert_eq!(candles.iter().filter(|c| c.is_valid()).count(), 29);

        let csv = "1700000000000,100,105,98,103,10,1700000059999,1000,5,4,400,0\n\
                   1700000060000,103,oops,101,102,12,1700000119999,1200,6,5,500,0\n";
        let candles = parse_klines_csv(csv).unwrap();
        assert_eq!(candles.len(), 2);
        assert!(candles[0].is_valid());
        assert!(!candles[1].is_valid());
    }

    #[test]
    fn corrupt_open_time_is_rejected() {
        for open_time in ["\"NaN\"", "\"1e30\"", "\"12.5\"", "\"soon\""] {
            let text =
                format!(r#"[{open_time}, "1", "1", "1", "1", "1", 2, "1", 1, "1", "1", "0"]"#);
            let row: Vec<Value> = serde_json::from_str(&text).unwrap();
            let err = KlineRecord::from_json_row(&row).unwrap_err();
            assert!(matches!(err, KlineError::InvalidField { field: "open_time", .. }));
        }
        let row: Vec<Value> = serde_json::from_str(
            r#"["1700000000000.0", "1", "1", "1", "1", "1", 2, "1", 1, "1", "1", "0"]"#,
        )
        .unwrap();
        assert_eq!(KlineRecord::from_json_row(&row).unwrap().open_time, 1_700_000_000_000);
    }

    #[test]
    fn parses_csv_rows() {
        let content = "1700000000000,100,105,98,103,10,1700000059999,1000,5,4,400,0\n\
                       1700000060000,103,104,101,102,12,1700000119999,1200,6,5,500,0\n";
        let candles = parse_klines_csv(content).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].close, 102.0);
    }

    #[test]
    fn csv_row_with_eleven_fields_is_rejected() {
        let content = "1700000000000,100,105,98,103,10,1700000059999,1000,5,4,400\n";
        assert!(matches!(
            parse_klines_csv(content),
            Err(KlineError::FieldCount { found: 11, .. })
        ));
    }

    #[test]
    fn parses_json_document() {
        let content = format!("[{ROW}]");
        let candles = parse_klines_json(&content).unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].open, 100.0);
    }
}
