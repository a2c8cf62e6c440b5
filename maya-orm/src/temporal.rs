//! # Temporal Conversion Module
//!
//! Moves date/time values between chrono types and the textual forms stored
//! by MySQL `DATETIME`/`TIMESTAMP`, SQL Server `DATETIME2` and SQLite `TEXT`
//! columns.
//!
//! All three dialects accept `YYYY-MM-DD HH:MM:SS[.ffffff]` for binding, so a
//! single storage format is used. Parsing is lenient: it accepts that format,
//! the ISO 8601 `T` separator, RFC 3339 strings with an offset (normalized to
//! UTC) and bare dates (midnight).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::Error;

/// Storage format for datetimes.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Storage format for dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Formatting
// ============================================================================

/// Formats a naive datetime for binding.
pub fn format_datetime(value: &NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

/// Formats a UTC datetime for binding (offset dropped, value kept in UTC).
pub fn format_datetime_utc(value: &DateTime<Utc>) -> String {
    format_datetime(&value.naive_utc())
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses any supported textual datetime into a naive (UTC) datetime.
pub fn parse_datetime(value: &str) -> Result<NaiveDateTime, Error> {
    let value = value.trim();

    for format in [DATETIME_FORMAT, "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc).naive_utc());
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT)
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(midnight);
    }

    Err(Error::Conversion(format!("Failed to parse datetime: {}", value)))
}

/// Parses a date, accepting full datetimes and keeping only the date part.
pub fn parse_date(value: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .or_else(|_| parse_datetime(value).map(|dt| dt.date()))
        .map_err(|_| Error::Conversion(format!("Failed to parse date: {}", value)))
}

// ============================================================================
// Tests
// ============================================================================
