use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::AttendanceError;

/// Normalizes a caller supplied date to its calendar day.
///
/// Accepts `2024-01-01`, `2024-01-01T10:30:00[.fff]` and RFC 3339 timestamps.
/// The time of day is dropped and the day is taken as written, without
/// converting between offsets.
pub fn parse_day(raw: &str) -> Result<NaiveDate, AttendanceError> {
    let raw = raw.trim();

    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(day);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.date_naive());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(ts.date());
    }

    Err(AttendanceError::Validation(format!(
        "Invalid date '{raw}', expected YYYY-MM-DD"
    )))
}

pub fn parse_optional_day(raw: Option<&str>) -> Result<Option<NaiveDate>, AttendanceError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_day(value).map(Some),
    }
}
