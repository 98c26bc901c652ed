//! Time windows over a session: a relative cutoff (`"5 minutes ago"`), Unix
//! second bounds, or the last N turns.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use tracing::{debug, instrument};

use crate::error::{MetaError, Result};
use crate::model::SessionEntry;
use crate::util::parse_timestamp;

const AGO_SUFFIX: &str = " ago";

/// Parse `"<n> <unit> ago"`, unit one of second, minute, hour or day.
///
/// Case-insensitive; units may be plural.
pub fn parse_relative_duration(value: &str) -> Result<Duration> {
    let invalid = |reason: &str| MetaError::invalid_argument("since", format!("{reason}: \"{value}\""));

    let lower = value.trim().to_lowercase();
    let Some(amount_unit) = lower.strip_suffix(AGO_SUFFIX) else {
        return Err(invalid("duration must end with ' ago'"));
    };
    let parts: Vec<&str> = amount_unit.split_whitespace().collect();
    let &[amount, unit] = parts.as_slice() else {
        return Err(invalid("expected '<number> <unit> ago'"));
    };

    let amount = i64::from(amount.parse::<u32>().map_err(|_| invalid("invalid number"))?);
    let unit = if unit.len() > 1 {
        unit.strip_suffix('s').unwrap_or(unit)
    } else {
        unit
    };
    match unit {
        "second" => Ok(Duration::seconds(amount)),
        "minute" => Ok(Duration::minutes(amount)),
        "hour" => Ok(Duration::hours(amount)),
        "day" => Ok(Duration::days(amount)),
        _ => Err(invalid("unknown time unit")),
    }
}

/// Instant `value` (a relative duration) before `now`.
fn since_cutoff(value: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let duration = parse_relative_duration(value)?;
    now.checked_sub_signed(duration)
        .ok_or_else(|| MetaError::invalid_argument("since", format!("out of range: \"{value}\"")))
}

/// Turn a relative `--since` into an RFC 3339 timestamp; anything else is
/// returned unchanged.
pub fn resolve_since(value: &str, now: DateTime<Utc>) -> Result<String> {
    if value.trim().to_lowercase().ends_with(AGO_SUFFIX) {
        Ok(since_cutoff(value, now)?.to_rfc3339_opts(SecondsFormat::Secs, true))
    } else {
        Ok(value.to_string())
    }
}

/// Window of entries kept before an analysis runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeFilter {
    /// Relative cutoff such as `"5 minutes ago"`.
    pub since: Option<String>,
    /// Keep only the last N turns (0 = off). Overrides every other bound.
    pub last_n_turns: usize,
    /// Earliest Unix second kept.
    pub from_ts: Option<i64>,
    /// Latest Unix second kept.
    pub to_ts: Option<i64>,
}

impl TimeFilter {
    /// Whether no window is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Entries inside the window, in file order.
    ///
    /// With a timestamp bound active, entries whose timestamp does not parse
    /// are dropped.
    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    pub fn apply(&self, entries: Vec<SessionEntry>, now: DateTime<Utc>) -> Result<Vec<SessionEntry>> {
        if self.is_empty() {
            return Ok(entries);
        }

        if self.last_n_turns > 0 {
            let kept = last_turns(entries, self.last_n_turns);
            debug!(kept = kept.len(), turns = self.last_n_turns, "Kept last turns");
            return Ok(kept);
        }

        let cutoff = self.since.as_deref().map(|s| since_cutoff(s, now)).transpose()?;
        let kept: Vec<SessionEntry> = entries
            .into_iter()
            .filter(|entry| {
                let Some(t) = parse_timestamp(&entry.timestamp) else {
                    return false;
                };
                cutoff.map_or(true, |c| t >= c)
                    && self.from_ts.map_or(true, |from| t.timestamp() >= from)
                    && self.to_ts.map_or(true, |to| t.timestamp() <= to)
            })
            .collect();

        debug!(kept = kept.len(), ?cutoff, "Applied time window");
        Ok(kept)
    }
}

/// Entries from the `n`-th last message on, trailing non-message entries
/// included. The whole session when it has fewer than `n` messages.
fn last_turns(mut entries: Vec<SessionEntry>, n: usize) -> Vec<SessionEntry> {
    let start = entries
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, entry)| entry.is_message())
        .nth(n.saturating_sub(1))
        .map_or(0, |(i, _)| i);
    entries.split_off(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::JsonlParser;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const SESSION: &str = r#"{"type":"user","uuid":"u1","timestamp":"2025-10-02T10:00:00Z","message":{"role":"user","content":"start"}}
{"type":"assistant","uuid":"a1","timestamp":"2025-10-02T10:30:00Z","message":{"role":"assistant","content":"ok"}}
{"type":"file-history-snapshot","uuid":"f1","timestamp":"2025-10-02T10:45:00Z"}
{"type":"user","uuid":"u2","timestamp":"2025-10-02T11:50:00Z","message":{"role":"user","content":"next"}}
{"type":"assistant","uuid":"a2","timestamp":"not a time","message":{"role":"assistant","content":"done"}}
{"type":"system","uuid":"s1","timestamp":"2025-10-02T11:59:00Z"}"#;

    fn entries() -> Vec<SessionEntry> {
        JsonlParser::new().parse_str(SESSION).unwrap()
    }

    fn now() -> DateTime<Utc> {
        parse_timestamp("2025-10-02T12:00:00Z").unwrap()
    }

    fn uuids(entries: &[SessionEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.uuid.as_str()).collect()
    }

    #[rstest]
    #[case("30 seconds ago", 30)]
    #[case("1 second ago", 1)]
    #[case("5 minutes ago", 300)]
    #[case("2 Hours Ago", 7200)]
    #[case("  1 day ago ", 86_400)]
    fn test_parse_relative_duration(#[case] input: &str, #[case] seconds: i64) {
        assert_eq!(parse_relative_duration(input).unwrap().num_seconds(), seconds);
    }

    #[rstest]
    #[case("5 minutes", "must end with ' ago'")]
    #[case("minutes ago", "expected '<number> <unit> ago'")]
    #[case("five minutes ago", "invalid number")]
    #[case("-5 minutes ago", "invalid number")]
    #[case("3 weeks ago", "unknown time unit")]
    fn test_parse_relative_duration_errors(#[case] input: &str, #[case] reason: &str) {
        let err = parse_relative_duration(input).unwrap_err();
        assert!(matches!(err, MetaError::InvalidArgument { ref name, .. } if name == "since"));
        assert!(err.to_string().contains(reason), "{err}");
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let filter = TimeFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.apply(entries(), now()).unwrap(), entries());
    }

    #[test]
    fn test_since_drops_older_and_unparsable() {
        let filter = TimeFilter {
            since: Some("90 minutes ago".into()),
            ..TimeFilter::default()
        };
        let kept = filter.apply(entries(), now()).unwrap();
        // cutoff 10:30:00 is inclusive
        assert_eq!(uuids(&kept), vec!["a1", "f1", "u2", "s1"]);
    }

    #[test]
    fn test_unix_bounds() {
        let filter = TimeFilter {
            from_ts: Some(1_759_399_200 + 1800),
            to_ts: Some(1_759_399_200 + 2700),
            ..TimeFilter::default()
        };
        let kept = filter.apply(entries(), now()).unwrap();
        assert_eq!(uuids(&kept), vec!["a1", "f1"]);
    }

    #[test]
    fn test_last_n_turns_counts_messages() {
        let filter = TimeFilter {
            last_n_turns: 2,
            since: Some("1 second ago".into()),
            ..TimeFilter::default()
        };
        let kept = filter.apply(entries(), now()).unwrap();
        assert_eq!(uuids(&kept), vec!["u2", "a2", "s1"]);

        let everything = TimeFilter {
            last_n_turns: 10,
            ..TimeFilter::default()
        };
        assert_eq!(everything.apply(entries(), now()).unwrap().len(), 6);
    }

    #[test]
    fn test_invalid_since_is_an_error() {
        let filter = TimeFilter {
            since: Some("yesterday".into()),
            ..TimeFilter::default()
        };
        assert!(filter.apply(entries(), now()).is_err());
    }

    #[test]
    fn test_resolve_since() {
        assert_eq!(resolve_since("2 hours ago", now()).unwrap(), "2025-10-02T10:00:00Z");
        assert_eq!(resolve_since("2025-01-01T00:00:00Z", now()).unwrap(), "2025-01-01T00:00:00Z");
        assert!(resolve_since("x hours ago", now()).is_err());
    }
}
