//! Date-time parsing for log timestamps and time-range input.
//!
//! Accepts the ISO-style forms a user types into a range field
//! (`2023-06-21`, `2023-06-21T13:43`, `2023-06-21T13:43:55.123`, with or
//! without a zone suffix). Values without a zone are read as UTC; values
//! with one are converted to UTC, so every parsed instant is comparable.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Offset-carrying forms RFC 3339 does not cover.
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// Field-level validation failure for a time-range input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid timestamp '{input}': expected a date time string such as 2023-06-21T13:43:55")]
pub struct TimestampError {
    pub input: String,
}

/// Parses `input` into a UTC instant, or `None` when it is not a date-time.
pub fn parse_timestamp(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_utc());
    }
    if let Some(dt) = ZONED_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(input, fmt).ok())
    {
        return Some(dt.naive_utc());
    }
    if let Some(naive) = input.strip_suffix(['Z', 'z']) {
        return parse_naive(naive);
    }
    parse_naive(input)
}

fn parse_naive(input: &str) -> Option<NaiveDateTime> {
    if let Some(dt) = DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
    {
        return Some(dt);
    }

    // Date-only, year-month and year forms start at midnight of their first day.
    let date = match input.len() {
        10 => NaiveDate::parse_from_str(input, "%Y-%m-%d").ok(),
        7 => NaiveDate::parse_from_str(&format!("{input}-01"), "%Y-%m-%d").ok(),
        4 if input.bytes().all(|b| b.is_ascii_digit()) => {
            NaiveDate::parse_from_str(&format!("{input}-01-01"), "%Y-%m-%d").ok()
        }
        _ => None,
    };
    date.and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Cuts an engine timestamp down to millisecond precision.
///
/// `2023-06-21T13:43:55.123456789Z` becomes `2023-06-21T13:43:55.123`; the
/// zone suffix goes with the extra digits. Timestamps without a fractional
/// part are returned whole.
pub fn truncate_to_millis(timestamp: &str) -> &str {
    match timestamp.find('.') {
        Some(dot) => {
            let end = (dot + 4).min(timestamp.len());
            timestamp.get(..end).unwrap_or(timestamp)
        }
        None => timestamp,
    }
}

/// Validates user input for a range bound.
pub fn validate_timestamp(input: &str) -> Result<NaiveDateTime, TimestampError> {
    parse_timestamp(input).ok_or_else(|| TimestampError {
        input: input.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_date_time_forms() {
        let full = parse_timestamp("2023-06-21T13:43:55").unwrap();
        assert_eq!((full.hour(), full.minute(), full.second()), (13, 43, 55));

        let minutes = parse_timestamp("2023-06-21T13:43").unwrap();
        assert_eq!(minutes.second(), 0);

        let spaced = parse_timestamp("2023-06-21 13:43:55.5").unwrap();
        assert_eq!(spaced.nanosecond(), 500_000_000);
    }

    #[test]
    fn test_parse_partial_dates() {
        let date = parse_timestamp("2023-06-21").unwrap();
        assert_eq!((date.day(), date.hour()), (21, 0));

        let month = parse_timestamp("2023-06").unwrap();
        assert_eq!((month.month(), month.day()), (6, 1));

        let year = parse_timestamp("2024").unwrap();
        assert_eq!((year.year(), year.month()), (2024, 1));
    }

    #[test]
    fn test_parse_zoned_values_convert_to_utc() {
        let zulu = parse_timestamp("2023-06-21T13:43:55.123Z").unwrap();
        let naive = parse_timestamp("2023-06-21T13:43:55.123").unwrap();
        assert_eq!(zulu, naive);

        let offset = parse_timestamp("2023-06-21T15:43:55+02:00").unwrap();
        assert_eq!(offset.hour(), 13);

        let no_seconds = parse_timestamp("2023-06-21T13:43+02:00").unwrap();
        assert_eq!((no_seconds.hour(), no_seconds.minute(), no_seconds.second()), (11, 43, 0));

        let spaced = parse_timestamp("2023-06-21 13:43:55.5-01:00").unwrap();
        assert_eq!((spaced.hour(), spaced.nanosecond()), (14, 500_000_000));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("not-a-date").is_none());
        assert!(parse_timestamp("2023-13-45").is_none());
        assert!(parse_timestamp("12").is_none());
    }

    #[test]
    fn test_truncate_to_millis() {
        assert_eq!(
            truncate_to_millis("2023-06-21T13:43:55.123456789Z"),
            "2023-06-21T13:43:55.123"
        );
        assert_eq!(truncate_to_millis("2023-06-21T13:43:55.1Z"), "2023-06-21T13:43:55.1Z");
        assert_eq!(truncate_to_millis("2023-06-21T13:43:55Z"), "2023-06-21T13:43:55Z");
    }

    #[test]
    fn test_validate_reports_input() {
        let err = validate_timestamp("yesterday").unwrap_err();
        assert_eq!(err.input, "yesterday");
        assert!(validate_timestamp("2023-06-21T13:43:55").is_ok());
    }
}
