//! Converts Slack message timestamps (`"1700000000.000100"`) into a short
//! local-time label used when a message has no usable first line.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;

pub const DISPLAY_FORMAT: &str = "%d/%m - %H:%M";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TimestampError {
    #[error("timestamp `{0}` is not a numeric epoch-seconds value")]
    NotNumeric(String),
    #[error("timestamp `{0}` is outside the representable date range")]
    OutOfRange(String),
}

/// Parses epoch seconds with an optional fractional part.
///
/// Only the `digits[.digits]` shape Slack emits is accepted; signs, padding and
/// exponents would yield a different thread key for the same instant.
pub fn parse_epoch(raw: &str) -> Result<DateTime<Utc>, TimestampError> {
    if !is_canonical_epoch(raw) {
        return Err(TimestampError::NotNumeric(raw.to_owned()));
    }
    let seconds: f64 = raw.parse().map_err(|_| TimestampError::NotNumeric(raw.to_owned()))?;

    let whole = seconds.floor();
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return Err(TimestampError::OutOfRange(raw.to_owned()));
    }
    let nanos = ((seconds - whole) * 1_000_000_000.0).round().min(999_999_999.0) as u32;

    DateTime::from_timestamp(whole as i64, nanos)
        .ok_or_else(|| TimestampError::OutOfRange(raw.to_owned()))
}

fn is_canonical_epoch(raw: &str) -> bool {
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    match raw.split_once('.') {
        Some((whole, fraction)) => all_digits(whole) && all_digits(fraction),
        None => all_digits(raw),
    }
}

pub fn localize(raw: &str, timezone: Tz) -> Result<String, TimestampError> {
    let instant = parse_epoch(raw)?;
    Ok(instant.with_timezone(&timezone).format(DISPLAY_FORMAT).to_string())
}
