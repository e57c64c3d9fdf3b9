//! Date/time utilities for bookfeed.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// Offset-less date-time layouts accepted for feed dates, interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Date-only layouts accepted for feed dates, interpreted as UTC midnight.
const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a raw feed date string.
///
/// Tries RFC 2822 (RSS `pubDate`), RFC 3339 (Atom, Dublin Core), an ISO 8601
/// variant with a compact offset, and finally a few offset-less layouts
/// which are taken as UTC.
///
/// # Returns
///
/// `None` when the value is empty or matches none of the layouts.
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

/// Milliseconds since the epoch of a raw feed date, or 0 when unparsable.
pub fn sort_timestamp(raw: &str) -> i64 {
    parse_feed_date(raw)
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

/// Reference "now": the UTC instant shifted by a fixed number of hours.
///
/// This mirrors the organization's civil clock (UTC+9, no daylight saving)
/// and is compared directly against parsed feed instants. An offset that
/// overflows the calendar leaves `now_utc` unshifted.
pub fn reference_now(now_utc: DateTime<Utc>, offset_hours: i64) -> DateTime<Utc> {
    Duration::try_hours(offset_hours)
        .and_then(|offset| now_utc.checked_add_signed(offset))
        .unwrap_or(now_utc)
}
