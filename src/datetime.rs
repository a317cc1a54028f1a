// Date and time helpers
// Dates compare as milliseconds since the Unix epoch

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

/// DateTime errors
#[derive(Error, Debug)]
pub enum DateTimeError {
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Parse an ISO 8601 datetime string.
///
/// Strings without an offset are read as UTC.
pub fn parse_iso8601(s: &str) -> Result<DateTime<Utc>, DateTimeError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| DateTimeError::ParseError(format!("{}: {}", s, e)))
}

/// Format a datetime as ISO 8601 string
pub fn format_iso8601(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Milliseconds since the Unix epoch.
#[inline]
pub fn to_epoch_millis(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

/// Fractional seconds since the Unix epoch, as Python's `datetime.fromtimestamp` takes them.
pub fn to_epoch_seconds(dt: &DateTime<Utc>) -> f64 {
    to_epoch_millis(dt) as f64 / 1000.0
}

/// Inverse of [`to_epoch_millis`]; `None` when out of chrono's range.
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_offset() {
        let dt = parse_iso8601("2024-03-01T12:00:00+02:00").unwrap();
        assert_eq!(format_iso8601(&dt), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_parse_naive_as_utc() {
        let dt = parse_iso8601("2024-03-01T12:00:00.250").unwrap();
        assert_eq!(to_epoch_millis(&dt) % 1000, 250);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            parse_iso8601("yesterday"),
            Err(DateTimeError::ParseError(_))
        ));
    }

    #[test]
    fn test_millis_roundtrip() {
        let dt = from_epoch_millis(1_700_000_000_123).unwrap();
        assert_eq!(to_epoch_millis(&dt), 1_700_000_000_123);
    }

    #[test]
    fn test_epoch_seconds_keep_millis() {
        let dt = parse_iso8601("2024-03-01T10:00:00.250Z").unwrap();
        assert_eq!(to_epoch_seconds(&dt), 1_709_287_200.25);
        assert_eq!(to_epoch_seconds(&from_epoch_millis(-1_500).unwrap()), -1.5);
    }
}
