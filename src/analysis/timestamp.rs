//! Timestamp normalization to UTC.
//!
//! Upstream timestamps arrive naive, with a literal `Z`, or with an explicit
//! offset. Everything leaves this module as RFC 3339 with a `+00:00` offset.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use thiserror::Error;
use tracing::debug;

use crate::models::TimeWindow;

/// Offset-carrying layouts accepted besides strict RFC 3339.
const AWARE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// Naive layouts. The `T`-separated form has no fractional variant: those
/// go through the truncating fallback.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Error)]
pub enum TimestampError {
    #[error("unparseable timestamp '{input}'")]
    Unparseable { input: String },

    #[error("window of {minutes} minutes is out of range")]
    WindowOutOfRange { minutes: i64 },
}

/// Parse a timestamp into UTC. Empty input yields `Ok(None)`.
pub fn parse_utc(raw: &str) -> Result<Option<DateTime<Utc>>, TimestampError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let normalized = trimmed.replace('Z', "+00:00");
    if let Some(parsed) = parse_direct(&normalized) {
        return Ok(Some(parsed));
    }

    // One retry: drop the fraction and pin the result to UTC.
    let retry = if !normalized.contains('+') && normalized.contains('T') {
        let head = normalized.split('.').next().unwrap_or(&normalized);
        format!("{}+00:00", head)
    } else {
        normalized
    };
    debug!("Retrying timestamp '{}' as '{}'", raw, retry);

    parse_direct(&retry)
        .map(Some)
        .ok_or_else(|| TimestampError::Unparseable {
            input: raw.to_string(),
        })
}

/// Normalize an optional timestamp to RFC 3339 with a `+00:00` offset.
pub fn to_utc_with_offset(raw: Option<&str>) -> Result<Option<String>, TimestampError> {
    match raw {
        Some(raw) => Ok(parse_utc(raw)?.map(|dt| format_utc(&dt))),
        None => Ok(None),
    }
}

/// RFC 3339 with `+00:00`; microseconds only when non-zero.
pub fn format_utc(dt: &DateTime<Utc>) -> String {
    let precision = if dt.timestamp_subsec_nanos() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    dt.to_rfc3339_opts(precision, false)
}

/// The `minutes`-long window that ends at `end`. `minutes` must be positive
/// and small enough that the start stays representable.
pub fn window_ending_at(end: DateTime<Utc>, minutes: i64) -> Result<TimeWindow, TimestampError> {
    let start = Some(minutes)
        .filter(|m| *m > 0)
        .and_then(Duration::try_minutes)
        .and_then(|span| end.checked_sub_signed(span))
        .ok_or(TimestampError::WindowOutOfRange { minutes })?;

    Ok(TimeWindow {
        from: format_utc(&start),
        to: format_utc(&end),
    })
}

fn parse_direct(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in AWARE_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
