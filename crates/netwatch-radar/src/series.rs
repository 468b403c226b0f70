//! Shape-probing extraction of the timeseries from a Radar `result`.
//!
//! The service has shipped several result shapes over time. Rather than
//! reflect over arbitrary JSON, this module tries a declared precedence:
//!
//! 1. a result object with a named series field (`serie_0`, `serie0`,
//!    `series`, `data`, `timeseries`) holding parallel
//!    `timestamps`/`values` arrays;
//! 2. an array of series, using the first;
//! 3. `timestamps`/`values` directly on the result;
//! 4. an array of `[timestamp, value]` pairs or `{timestamp, value}`
//!    objects.
//!
//! Timestamps are RFC3339 strings or integer seconds; values are numbers
//! or numeric strings. A series with values but no (or mismatched)
//! timestamps is still accepted; the sample builder synthesizes hourly
//! timestamps in that case.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

/// Named fields that may hold the series inside a result object.
const SERIES_KEYS: &[&str] = &["serie_0", "serie0", "series", "data", "timeseries"];

/// Timestamp field names accepted inside pair objects.
const PAIR_TS_KEYS: &[&str] = &["timestamp", "ts", "date", "datetime", "time"];

/// Value field names accepted inside pair objects.
const PAIR_VALUE_KEYS: &[&str] = &["value", "val", "y"];

/// An extracted, not-yet-normalized series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSeries {
    /// Parsed timestamps; may be empty or shorter than `values`
    pub timestamps: Vec<DateTime<Utc>>,
    /// Raw values in upstream units
    pub values: Vec<f64>,
}

impl RawSeries {
    /// Keep only the trailing `n` entries of both arrays.
    pub fn truncate_to_last(&mut self, n: usize) {
        if self.values.len() > n {
            self.values.drain(..self.values.len() - n);
        }
        if self.timestamps.len() > n {
            self.timestamps.drain(..self.timestamps.len() - n);
        }
    }
}

/// Extract a series from the `result` field of a Radar envelope.
///
/// Returns `None` when no recognized shape yields at least one value.
#[must_use]
pub fn extract_series(result: &Value) -> Option<RawSeries> {
    match result {
        Value::Object(map) => {
            for key in SERIES_KEYS {
                if let Some(inner) = map.get(*key) {
                    if let Some(series) = series_from_value(inner) {
                        return Some(series);
                    }
                }
            }
            parallel_arrays(result)
        }
        Value::Array(_) => series_from_value(result),
        _ => None,
    }
}

/// Try to read one value as a series: a series object, an array of series
/// objects (first wins), or an array of pairs.
fn series_from_value(v: &Value) -> Option<RawSeries> {
    match v {
        Value::Object(map) => parallel_arrays(v).or_else(|| {
            // Some shapes nest pairs under a `data` field.
            map.get("data").and_then(pairs_from_value)
        }),
        Value::Array(items) => {
            let first = items.first()?;
            if first.is_object() && parallel_arrays(first).is_some() {
                return parallel_arrays(first);
            }
            pairs_from_value(v)
        }
        _ => None,
    }
}

/// Parallel `timestamps`/`values` arrays on one object.
fn parallel_arrays(v: &Value) -> Option<RawSeries> {
    let map = v.as_object()?;
    let values: Vec<f64> = map
        .get("values")
        .or_else(|| map.get("value"))
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_value).collect())
        .unwrap_or_default();
    if values.is_empty() {
        return None;
    }

    let timestamps: Vec<DateTime<Utc>> = map
        .get("timestamps")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_timestamp).collect())
        .unwrap_or_default();

    Some(RawSeries { timestamps, values })
}

/// An array of `[ts, value]` rows or `{timestamp, value}` objects.
fn pairs_from_value(v: &Value) -> Option<RawSeries> {
    let rows = v.as_array()?;
    let mut series = RawSeries::default();

    for row in rows {
        let (ts, value) = match row {
            Value::Array(cols) if cols.len() >= 2 => {
                (parse_timestamp(&cols[0]), parse_value(&cols[1]))
            }
            Value::Object(map) => {
                let ts = PAIR_TS_KEYS.iter().find_map(|k| map.get(*k)).and_then(parse_timestamp);
                let value = PAIR_VALUE_KEYS
                    .iter()
                    .find_map(|k| map.get(*k))
                    .and_then(parse_value);
                (ts, value)
            }
            _ => (None, None),
        };
        if let (Some(ts), Some(value)) = (ts, value) {
            series.timestamps.push(ts);
            series.values.push(value);
        }
    }

    if series.values.is_empty() {
        None
    } else {
        Some(series)
    }
}

/// RFC3339 string or unix seconds (integer or float).
fn parse_timestamp(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => {
            let secs = n.as_f64()?;
            Utc.timestamp_opt(secs as i64, 0).single()
        }
        _ => None,
    }
}

/// Number or numeric string.
fn parse_value(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
