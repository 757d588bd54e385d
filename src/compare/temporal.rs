//! Timestamp parsing and hour-distance calculation

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Naive formats providers commonly export alongside RFC 3339
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").expect("date pattern compiles"));

/// Parse a provider timestamp to an absolute instant
///
/// Tries RFC 3339, then the common naive date-time formats as UTC, and
/// finally falls back to extracting a `YYYY-M-D` date anywhere in the value,
/// taken as UTC midnight. Returns `None` when nothing in the value looks like
/// a date.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    let captures = DATE_PATTERN.captures(value)?;
    let year = captures[1].parse().ok()?;
    let month = captures[2].parse().ok()?;
    let day = captures[3].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

/// Absolute distance between two raw timestamps, in hours
///
/// `None` when either side is absent or fails to parse.
pub fn hour_distance(left: Option<&str>, right: Option<&str>) -> Option<f64> {
    let left = parse_timestamp(left?)?;
    let right = parse_timestamp(right?)?;
    let seconds = (left - right).num_seconds().abs();
    Some(seconds as f64 / 3600.0)
}
