//! Timestamp parsing and formatting.
//!
//! Every timestamp in candlekit is UTC with millisecond resolution. Text input
//! is accepted in the shapes people actually type on a command line or find in
//! exported spreadsheets; output always uses the dataset format
//! `YYYY-MM-DD HH:MM:SS` (with `.fff` only when milliseconds are present).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

/// Format used for the `timestamp` column of CSV datasets.
pub const DATASET_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimestampError {
    #[error("unrecognized timestamp '{0}' (expected YYYY-MM-DD[ HH:MM:SS], RFC 3339 or epoch ms)")]
    Unrecognized(String),

    #[error("epoch milliseconds out of range: {0}")]
    OutOfRange(i64),
}

/// Parse a UTC timestamp.
///
/// Accepted inputs:
/// - `2024-01-01 00:00:00` (optionally with fractional seconds)
/// - `2024-01-01T00:00:00`
/// - RFC 3339 (`2024-01-01T00:00:00Z`, `2024-01-01T02:00:00+02:00`)
/// - `2024-01-01` (midnight)
/// - epoch milliseconds (`1704067200000`)
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, TimestampError> {
    let s = input.trim();

    if !s.is_empty() && s.trim_start_matches('-').chars().all(|c| c.is_ascii_digit()) {
        let ms: i64 = s
            .parse()
            .map_err(|_| TimestampError::Unrecognized(input.to_string()))?;
        return DateTime::from_timestamp_millis(ms).ok_or(TimestampError::OutOfRange(ms));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(TimestampError::Unrecognized(input.to_string()))
}

/// Format a timestamp the way datasets store it.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    if ts.timestamp_subsec_millis() == 0 {
        ts.format(DATASET_TIMESTAMP_FORMAT).to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
    }
}

/// Serde adapter so candles serialize their timestamp as dataset text.
pub(crate) mod serde_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn jan1(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn parses_space_separated() {
        assert_eq!(parse_timestamp("2024-01-01 02:00:00").unwrap(), jan1(2));
    }

    #[test]
    fn parses_t_separated_and_rfc3339() {
        assert_eq!(parse_timestamp("2024-01-01T01:00:00").unwrap(), jan1(1));
        assert_eq!(parse_timestamp("2024-01-01T01:00:00Z").unwrap(), jan1(1));
        assert_eq!(parse_timestamp("2024-01-01T03:00:00+02:00").unwrap(), jan1(1));
    }

    #[test]
    fn parses_date_only_as_midnight() {
        assert_eq!(parse_timestamp("2024-01-01").unwrap(), jan1(0));
    }

    #[test]
    fn parses_epoch_millis() {
        assert_eq!(parse_timestamp("1704067200000").unwrap(), jan1(0));
    }

    #[test]
    fn parses_fractional_seconds() {
        let ts = parse_timestamp("2024-01-01 00:00:00.001").unwrap();
        assert_eq!(ts.timestamp_millis(), jan1(0).timestamp_millis() + 1);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(TimestampError::Unrecognized(_))
        ));
        assert!(parse_timestamp("").is_err());
    }

    #[test]
    fn formats_whole_seconds_without_fraction() {
        assert_eq!(format_timestamp(&jan1(1)), "2024-01-01 01:00:00");
    }

    #[test]
    fn formats_millis_when_present() {
        let ts = DateTime::from_timestamp_millis(jan1(0).timestamp_millis() + 250).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-01-01 00:00:00.250");
    }
}
