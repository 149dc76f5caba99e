//! `Retry-After` handling for throttled responses.

use std::time::Duration;

use time::format_description::well_known::Rfc2822;
use time::OffsetDateTime;

/// Parses a `Retry-After` value given either as delay seconds or as an HTTP date.
///
/// Returns `None` for values that are neither, so the caller can apply its default.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    parse_retry_after_at(value, OffsetDateTime::now_utc())
}

/// Same as [`parse_retry_after`], relative to an explicit `now`.
pub fn parse_retry_after_at(value: &str, now: OffsetDateTime) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    // HTTP dates always end in "GMT"; the RFC 2822 parser wants a numeric zone.
    let normalized = match value.strip_suffix("GMT") {
        Some(prefix) => format!("{prefix}+0000"),
        None => value.to_owned(),
    };
    let at = OffsetDateTime::parse(&normalized, &Rfc2822).ok()?;
    let wait = at - now;

    if wait.is_negative() {
        Some(Duration::ZERO)
    } else {
        Some(Duration::from_secs_f64(wait.as_seconds_f64()))
    }
}
