//! Date and timestamp normalization
//!
//! The federation sends dates as ISO-8601 with an offset
//! (`2025-09-14T15:00:00+02:00`), as naive datetimes, or as plain dates.
//! Dates are stored as `YYYY-MM-DD` using the calendar date as written.
//! Timestamps are stored as UTC `YYYY-MM-DD HH:MM:SS`; naive values are
//! taken to be UTC already.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

fn parse_naive(input: &str) -> Option<NaiveDateTime> {
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
}

/// Normalize to `YYYY-MM-DD`, `None` when the input does not parse
pub fn normalize_date(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.date_naive().format(DATE_FORMAT).to_string());
    }

    if let Some(dt) = parse_naive(input) {
        return Some(dt.date().format(DATE_FORMAT).to_string());
    }

    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .ok()
        .map(|d| d.format(DATE_FORMAT).to_string())
}

/// Normalize to UTC `YYYY-MM-DD HH:MM:SS`, `None` when the input does not parse
pub fn normalize_timestamp(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc).format(TIMESTAMP_FORMAT).to_string());
    }

    if let Some(dt) = parse_naive(input) {
        return Some(dt.format(TIMESTAMP_FORMAT).to_string());
    }

    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
}

/// Optional timestamp field: absent and unparsable both become `None`
pub fn optional_timestamp(input: Option<&str>) -> Option<String> {
    input.and_then(normalize_timestamp)
}

/// Optional date field: absent and unparsable both become `None`
pub fn optional_date(input: Option<&str>) -> Option<String> {
    input.and_then(normalize_date)
}
