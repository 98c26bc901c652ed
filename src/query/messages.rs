//! User prompts, with optional surrounding turns.

use std::collections::HashMap;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::sort_directed;
use crate::error::{MetaError, Result, ValidationError};
use crate::model::SessionEntry;
use crate::turns::TurnIndex;
use crate::util::{paginate, truncate_chars};

/// Prefixes of user entries written by Claude Code itself rather than typed
/// by the user.
pub const SYSTEM_MESSAGE_PREFIXES: &[&str] = &[
    "<command-message>",
    "<command-name>",
    "<command-args>",
    "<local-command",
    "Caveat:",
    "# meta-",
];

/// Characters kept in a [`ContextEntry`] summary.
const SUMMARY_CHARS: usize = 120;

/// Whether text is a synthetic system message (slash-command echo, caveat).
#[must_use]
pub fn is_system_message(content: &str) -> bool {
    let trimmed = content.trim();
    !trimmed.is_empty() && SYSTEM_MESSAGE_PREFIXES.iter().any(|p| trimmed.starts_with(p))
}

/// Sort key for user messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserMessageSort {
    /// Turn number.
    #[default]
    TurnSequence,
    /// Timestamp string.
    Timestamp,
    /// Entry UUID.
    Uuid,
}

impl FromStr for UserMessageSort {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "turn_sequence" | "turn" => Ok(Self::TurnSequence),
            "timestamp" => Ok(Self::Timestamp),
            "uuid" => Ok(Self::Uuid),
            _ => Err(ValidationError::new("sort_by", s, &["turn_sequence", "timestamp", "uuid"])),
        }
    }
}

/// Options for [`build_user_messages`].
#[derive(Debug, Clone, Default)]
pub struct UserMessagesOptions {
    /// Regex the message content must match.
    pub pattern: Option<String>,
    /// Turns of context to attach on each side (0 = none).
    pub context: usize,
    /// Maximum messages returned (0 = no limit).
    pub limit: usize,
    /// Messages skipped before the limit applies.
    pub offset: usize,
    /// Sort key.
    pub sort_by: UserMessageSort,
    /// Sort descending.
    pub reverse: bool,
}

/// A prompt typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessage {
    /// Turn number.
    pub turn_sequence: usize,
    /// Entry UUID.
    pub uuid: String,
    /// Entry timestamp.
    pub timestamp: String,
    /// Text blocks concatenated.
    pub content: String,
    /// Turns before this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context_before: Vec<ContextEntry>,
    /// Turns after this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context_after: Vec<ContextEntry>,
}

/// A neighbouring turn attached to a user message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Turn number.
    pub turn: usize,
    /// Message role.
    pub role: String,
    /// Text, cut to 120 characters.
    pub summary: String,
    /// Tools invoked in the turn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<String>,
}

impl ContextEntry {
    fn from_entry(entry: &SessionEntry, turn: usize) -> Option<Self> {
        let message = entry.message.as_ref()?;
        Some(Self {
            turn,
            role: message.role.clone(),
            summary: truncate_chars(&message.concatenated_text(), SUMMARY_CHARS),
            tool_calls: message.tool_uses().map(|t| t.name.clone()).collect(),
        })
    }
}

/// User entries with non-empty text that are not system messages.
pub(crate) fn extract_user_messages(entries: &[SessionEntry], turn_index: &TurnIndex) -> Vec<UserMessage> {
    entries
        .iter()
        .filter(|e| e.is_user() && e.message.is_some())
        .filter_map(|entry| {
            let content = entry.concatenated_text();
            if content.is_empty() || is_system_message(&content) {
                return None;
            }
            Some(UserMessage {
                turn_sequence: turn_index.get(&entry.uuid).unwrap_or_default(),
                uuid: entry.uuid.clone(),
                timestamp: entry.timestamp.clone(),
                content,
                ..UserMessage::default()
            })
        })
        .collect()
}

/// Compile an optional user-supplied regex.
pub(crate) fn compile_pattern(pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern
        .filter(|p| !p.is_empty())
        .map(|p| Regex::new(p).map_err(|e| MetaError::invalid_pattern(p, e)))
        .transpose()
}

fn attach_context(messages: &mut [UserMessage], entries: &[SessionEntry], turn_index: &TurnIndex, window: usize) {
    let by_turn: HashMap<usize, &SessionEntry> = entries
        .iter()
        .filter_map(|e| turn_index.get(&e.uuid).map(|turn| (turn, e)))
        .collect();

    let collect = |turns: std::ops::RangeInclusive<usize>| -> Vec<ContextEntry> {
        turns
            .filter_map(|turn| by_turn.get(&turn).and_then(|e| ContextEntry::from_entry(e, turn)))
            .collect()
    };

    for message in messages {
        let turn = message.turn_sequence;
        if turn > 0 {
            message.context_before = collect(turn.saturating_sub(window)..=turn - 1);
        }
        message.context_after = collect(turn + 1..=turn + window);
    }
}

/// User prompts matching the options: pattern filter, sort, context, then
/// offset and limit.
#[instrument(skip(entries), fields(entries = entries.len()))]
pub fn build_user_messages(entries: &[SessionEntry], opts: &UserMessagesOptions) -> Result<Vec<UserMessage>> {
    let pattern = compile_pattern(opts.pattern.as_deref())?;
    let turn_index = TurnIndex::build(entries);

    let mut messages = extract_user_messages(entries, &turn_index);
    if let Some(re) = &pattern {
        messages.retain(|m| re.is_match(&m.content));
    }

    sort_directed(&mut messages, opts.reverse, |a, b| match opts.sort_by {
        UserMessageSort::TurnSequence => a.turn_sequence.cmp(&b.turn_sequence),
        UserMessageSort::Timestamp => a.timestamp.cmp(&b.timestamp),
        UserMessageSort::Uuid => a.uuid.cmp(&b.uuid),
    });

    if opts.context > 0 {
        attach_context(&mut messages, entries, &turn_index, opts.context);
    }

    let messages = paginate(messages, opts.offset, opts.limit);
    debug!(messages = messages.len(), "Built user messages");
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::JsonlParser;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const SESSION: &str = r#"{"type":"user","uuid":"u1","timestamp":"2025-10-02T10:00:00Z","message":{"role":"user","content":"<command-name>/clear</command-name>"}}
{"type":"user","uuid":"u2","timestamp":"2025-10-02T10:00:10Z","message":{"role":"user","content":"Add a retry to the fetcher"}}
{"type":"assistant","uuid":"a1","timestamp":"2025-10-02T10:00:20Z","message":{"role":"assistant","content":[{"type":"text","text":"Reading the fetcher."},{"type":"tool_use","id":"t1","name":"Read","input":{"file_path":"src/fetch.rs"}}]}}
{"type":"user","uuid":"u3","timestamp":"2025-10-02T10:00:30Z","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"t1","content":"..."}]}}
{"type":"file-history-snapshot","uuid":"f1","timestamp":"2025-10-02T10:00:35Z"}
{"type":"assistant","uuid":"a2","timestamp":"2025-10-02T10:00:40Z","message":{"role":"assistant","content":"Done."}}
{"type":"user","uuid":"u4","timestamp":"2025-10-02T10:00:05Z","message":{"role":"user","content":"  Now write tests for the retry"}}"#;

    fn entries() -> Vec<SessionEntry> {
        JsonlParser::new().parse_str(SESSION).unwrap()
    }

    #[rstest]
    #[case("<command-message>init</command-message>", true)]
    #[case("  Caveat: The messages below", true)]
    #[case("<local-command-stdout></local-command-stdout>", true)]
    #[case("# meta-cc query", true)]
    #[case("Fix the Caveat: handling", false)]
    #[case("   ", false)]
    fn test_is_system_message(#[case] content: &str, #[case] expected: bool) {
        assert_eq!(is_system_message(content), expected);
    }

    #[test]
    fn test_skips_system_and_tool_results() {
        let messages = build_user_messages(&entries(), &UserMessagesOptions::default()).unwrap();
        let turns: Vec<usize> = messages.iter().map(|m| m.turn_sequence).collect();
        assert_eq!(turns, vec![2, 6]);
        assert_eq!(messages[0].content, "Add a retry to the fetcher");
        assert!(messages[0].context_before.is_empty());
    }

    #[test]
    fn test_pattern_filter() {
        let opts = UserMessagesOptions {
            pattern: Some("(?i)tests?".into()),
            ..UserMessagesOptions::default()
        };
        let messages = build_user_messages(&entries(), &opts).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].uuid, "u4");
    }

    #[test]
    fn test_invalid_pattern() {
        let opts = UserMessagesOptions {
            pattern: Some("(unclosed".into()),
            ..UserMessagesOptions::default()
        };
        let err = build_user_messages(&entries(), &opts).unwrap_err();
        assert!(matches!(err, MetaError::InvalidPattern { .. }));
    }

    #[test]
    fn test_sort_by_timestamp_reverse() {
        let opts = UserMessagesOptions {
            sort_by: UserMessageSort::Timestamp,
            reverse: true,
            ..UserMessagesOptions::default()
        };
        let messages = build_user_messages(&entries(), &opts).unwrap();
        let uuids: Vec<&str> = messages.iter().map(|m| m.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["u2", "u4"]);
    }

    #[test]
    fn test_context_window() {
        let opts = UserMessagesOptions {
            context: 2,
            ..UserMessagesOptions::default()
        };
        let messages = build_user_messages(&entries(), &opts).unwrap();

        let first = &messages[0];
        assert_eq!(first.context_before.len(), 1);
        assert_eq!(first.context_before[0].turn, 1);
        let after: Vec<usize> = first.context_after.iter().map(|c| c.turn).collect();
        assert_eq!(after, vec![3, 4]);
        assert_eq!(first.context_after[0].role, "assistant");
        assert_eq!(first.context_after[0].summary, "Reading the fetcher.");
        assert_eq!(first.context_after[0].tool_calls, vec!["Read"]);

        let last = &messages[1];
        let before: Vec<usize> = last.context_before.iter().map(|c| c.turn).collect();
        assert_eq!(before, vec![4, 5]);
        assert!(last.context_after.is_empty());
    }

    #[test]
    fn test_pagination() {
        let opts = UserMessagesOptions {
            offset: 1,
            limit: 5,
            ..UserMessagesOptions::default()
        };
        let messages = build_user_messages(&entries(), &opts).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].uuid, "u4");

        let past_end = UserMessagesOptions {
            offset: 10,
            ..UserMessagesOptions::default()
        };
        assert!(build_user_messages(&entries(), &past_end).unwrap().is_empty());
    }

    #[test]
    fn test_summary_truncated() {
        let long = "y".repeat(130);
        let entry = JsonlParser::parse_entry(&format!(
            r#"{{"type":"assistant","uuid":"a","message":{{"role":"assistant","content":"{long}"}}}}"#
        ))
        .unwrap();
        let context = ContextEntry::from_entry(&entry, 3).unwrap();
        assert_eq!(context.summary.chars().count(), 123);
    }
}
