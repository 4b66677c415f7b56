//! Date normalization with fallback strategies.
//!
//! Converts one raw cell into a canonical `YYYY-MM-DD` string or a typed
//! failure reason. Strategies are tried in a fixed order, first match wins:
//!
//! 1. Missing markers (null, NaN) → `null_value`
//! 2. Strict `YYYY-MM-DD` string → calendar-validated, returned as-is
//! 3. `YYYY-MM-DDT...` string → validated and truncated to the date part
//! 4. Date/timestamp-typed value → formatted
//! 5. Number in the Unix-seconds window `[0, 4_102_444_800]` → converted
//! 6. Any other string → general parsing over a fixed set of formats
//! 7. Otherwise → `invalid_format`
//!
//! The numeric window (epoch through ~2100) deliberately rejects small or
//! huge numbers that are plausibly ordinal ids rather than timestamps,
//! trading recall for precision.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::models::Value;

/// Upper bound of the Unix-seconds window, roughly 2100-01-01.
const MAX_UNIX_SECONDS: f64 = 4_102_444_800.0;

/// Formats attempted by the general string fallback, in order.
const FALLBACK_FORMATS: &[&str] = &["%Y/%m/%d", "%m/%d/%Y", "%Y%m%d", "%d %B %Y", "%B %d, %Y"];

/// Why a value failed to normalize to a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    /// Null, NaN, or another missing marker.
    #[error("null_value")]
    NullValue,
    /// Looked like an ISO date but is not a real calendar date (`2024-02-30`).
    #[error("invalid_date: {0}")]
    InvalidDate(String),
    /// No strategy produced a date; carries the value's type label.
    #[error("invalid_format: {0}")]
    InvalidFormat(&'static str),
}

/// Normalizes one raw value to a canonical `YYYY-MM-DD` string.
pub fn normalize_date(value: &Value) -> Result<String, DateParseError> {
    if value.is_missing() {
        return Err(DateParseError::NullValue);
    }

    match value {
        Value::Text(s) => normalize_text(s),
        Value::Temporal(dt) => Ok(dt.format("%Y-%m-%d").to_string()),
        Value::Integer(_) | Value::Float(_) => {
            let n = value.as_number().expect("missing handled above");
            unix_seconds_to_iso(n).ok_or(DateParseError::InvalidFormat(value.type_name()))
        }
        Value::Missing => Err(DateParseError::NullValue),
    }
}

fn normalize_text(s: &str) -> Result<String, DateParseError> {
    let s = s.trim();
    if looks_like_iso_date(s) {
        return if parse_iso(s).is_some() {
            Ok(s.to_string())
        } else {
            Err(DateParseError::InvalidDate(s.to_string()))
        };
    }

    // ISO datetime: validate and keep the date part only.
    if s.len() > 10
        && s.is_char_boundary(10)
        && s.as_bytes()[10] == b'T'
        && looks_like_iso_date(&s[..10])
    {
        let date_part = &s[..10];
        return if parse_iso(date_part).is_some() {
            Ok(date_part.to_string())
        } else {
            Err(DateParseError::InvalidDate(date_part.to_string()))
        };
    }

    for format in FALLBACK_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Ok(date.format("%Y-%m-%d").to_string());
        }
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.format("%Y-%m-%d").to_string());
    }

    Err(DateParseError::InvalidFormat("text"))
}

/// Shape check for `YYYY-MM-DD` without calendar validation.
fn looks_like_iso_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit())
}

/// Parses a strict `YYYY-MM-DD` string into a calendar-validated date.
pub fn parse_iso(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn unix_seconds_to_iso(seconds: f64) -> Option<String> {
    if !(0.0..=MAX_UNIX_SECONDS).contains(&seconds) {
        return None;
    }
    let dt = DateTime::from_timestamp(seconds as i64, 0)?;
    Some(dt.format("%Y-%m-%d").to_string())
}

/// Whether `start <= end`; false if either string is not a valid ISO date.
pub fn validate_date_range(start: &str, end: &str) -> bool {
    match (parse_iso(start), parse_iso(end)) {
        (Some(start), Some(end)) => start <= end,
        _ => false,
    }
}
