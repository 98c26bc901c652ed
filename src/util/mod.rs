//! Utility functions shared across the crate:
//! - Character-aware text truncation for previews
//! - Timestamp parsing
//! - Offset/limit pagination

use chrono::{DateTime, Utc};

/// Truncate a string to at most `max_chars` characters, appending `...` when
/// anything was cut.
///
/// Counts characters, not bytes, so multi-byte UTF-8 text never splits.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// Parse an RFC 3339 timestamp into UTC.
///
/// Returns `None` for empty or malformed input; callers computing spans treat
/// that as "no data".
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse an RFC 3339 timestamp into Unix seconds.
#[must_use]
pub fn unix_seconds(value: &str) -> Option<i64> {
    parse_timestamp(value).map(|dt| dt.timestamp())
}

/// Skip `offset` items, then keep at most `limit` (0 = no limit).
#[must_use]
pub fn paginate<T>(items: Vec<T>, offset: usize, limit: usize) -> Vec<T> {
    let iter = items.into_iter().skip(offset);
    if limit > 0 {
        iter.take(limit).collect()
    } else {
        iter.collect()
    }
}
