//! Repeated tool-sequence mining.
//!
//! Tool calls are laid out in turn order and windows of 2 to 5 consecutive
//! calls are keyed by their tool names joined with [`SEQUENCE_SEPARATOR`].
//! Every window position counts as one occurrence, so a long run of the same
//! tools contributes to patterns of several lengths at once.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{MetaError, Result};
use crate::model::{extract_tool_calls, is_builtin_tool, SessionEntry};
use crate::turns::TurnIndex;
use crate::util::unix_seconds;

/// Separator between tool names in a pattern key.
pub const SEQUENCE_SEPARATOR: &str = " → ";

/// Shortest mined sequence.
pub const MIN_SEQUENCE_LENGTH: usize = 2;

/// Longest mined sequence.
pub const MAX_SEQUENCE_LENGTH: usize = 5;

/// A tool-call sequence that recurs within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencePattern {
    /// Tool names joined with [`SEQUENCE_SEPARATOR`].
    pub pattern: String,
    /// Number of tools in the pattern.
    pub length: usize,
    /// Number of occurrences.
    pub count: usize,
    /// Every window matching the pattern, in turn order.
    pub occurrences: Vec<SequenceOccurrence>,
    /// Minutes between the earliest and latest occurrence.
    #[serde(rename = "time_span_minutes")]
    pub time_span_min: i64,
}

/// One window matching a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceOccurrence {
    /// Turn of the first call in the window.
    pub start_turn: usize,
    /// Turn of the last call in the window.
    pub end_turn: usize,
    /// The calls making up the window.
    pub tools: Vec<ToolInSequence>,
}

/// A tool call within a sequence occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInSequence {
    /// Turn of the issuing entry.
    pub turn: usize,
    /// Tool name.
    pub tool: String,
    /// File path argument, if any.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,
    /// First command line, for Bash calls.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,
}

/// A tool call positioned on the turn axis.
#[derive(Debug, Clone)]
pub(crate) struct TurnToolCall {
    pub(crate) turn: usize,
    pub(crate) tool: String,
    pub(crate) file: String,
    pub(crate) command: String,
    pub(crate) unix_time: Option<i64>,
}

impl TurnToolCall {
    fn to_sequence_tool(&self) -> ToolInSequence {
        ToolInSequence {
            turn: self.turn,
            tool: self.tool.clone(),
            file: self.file.clone(),
            command: self.command.clone(),
        }
    }
}

/// Tool calls issued by message entries, in turn order.
///
/// With `include_builtin` false, built-in tools are dropped before windowing,
/// so the remaining calls become adjacent.
pub(crate) fn turn_ordered_calls(entries: &[SessionEntry], include_builtin: bool) -> Vec<TurnToolCall> {
    let turn_index = TurnIndex::build(entries);
    let mut calls: Vec<TurnToolCall> = extract_tool_calls(entries)
        .into_iter()
        .filter(|call| include_builtin || !is_builtin_tool(&call.tool_name))
        .filter_map(|call| {
            let turn = turn_index.get(&call.uuid)?;
            Some(TurnToolCall {
                turn,
                file: call.file_path().unwrap_or_default().to_string(),
                command: call.bash_command().unwrap_or_default().to_string(),
                unix_time: unix_seconds(&call.timestamp),
                tool: call.tool_name,
            })
        })
        .collect();
    calls.sort_by_key(|c| c.turn);
    calls
}

/// Split a pattern on `→` or `->`, trimming whitespace and dropping empties.
#[must_use]
pub fn parse_sequence_pattern(pattern: &str) -> Vec<String> {
    pattern
        .replace('→', "->")
        .split("->")
        .map(str::trim)
        .filter(|tool| !tool.is_empty())
        .map(String::from)
        .collect()
}

/// Every window whose tool names equal `tools`, in turn order.
pub(crate) fn find_pattern(calls: &[TurnToolCall], tools: &[String]) -> Vec<(usize, usize)> {
    if tools.is_empty() || tools.len() > calls.len() {
        return Vec::new();
    }
    calls
        .windows(tools.len())
        .enumerate()
        .filter(|(_, window)| window.iter().zip(tools).all(|(call, tool)| call.tool == *tool))
        .map(|(start, _)| (start, tools.len()))
        .collect()
}

/// Every window of `min_length..=5` calls, grouped by pattern key in
/// first-seen order.
pub(crate) fn mine_windows(calls: &[TurnToolCall], min_length: usize) -> IndexMap<String, Vec<(usize, usize)>> {
    let mut windows: IndexMap<String, Vec<(usize, usize)>> = IndexMap::new();
    let max_length = MAX_SEQUENCE_LENGTH.min(calls.len());

    for length in min_length.max(1)..=max_length {
        for (start, window) in calls.windows(length).enumerate() {
            let key = window
                .iter()
                .map(|c| c.tool.as_str())
                .collect::<Vec<_>>()
                .join(SEQUENCE_SEPARATOR);
            windows.entry(key).or_default().push((start, length));
        }
    }
    windows
}

/// Build a pattern from `(start, length)` windows over `calls`.
pub(crate) fn build_pattern(pattern: String, calls: &[TurnToolCall], windows: &[(usize, usize)]) -> SequencePattern {
    let length = windows.first().map_or(0, |(_, len)| *len);

    let occurrences = windows
        .iter()
        .map(|&(start, len)| {
            let window = &calls[start..start + len];
            SequenceOccurrence {
                start_turn: window[0].turn,
                end_turn: window[len - 1].turn,
                tools: window.iter().map(TurnToolCall::to_sequence_tool).collect(),
            }
        })
        .collect();

    SequencePattern {
        pattern,
        length,
        count: windows.len(),
        occurrences,
        time_span_min: time_span_minutes(calls, windows),
    }
}

/// Minutes between the earliest and latest window endpoint with a parsable
/// timestamp.
fn time_span_minutes(calls: &[TurnToolCall], windows: &[(usize, usize)]) -> i64 {
    let endpoints = windows
        .iter()
        .flat_map(|&(start, len)| [calls[start].unix_time, calls[start + len - 1].unix_time])
        .flatten();

    let (min, max) = endpoints.fold((None, None), |(min, max): (Option<i64>, Option<i64>), ts| {
        (Some(min.map_or(ts, |m| m.min(ts))), Some(max.map_or(ts, |m| m.max(ts))))
    });

    match (min, max) {
        (Some(min), Some(max)) => (max - min) / 60,
        _ => 0,
    }
}

/// Sort by count, then by pattern length, both descending. Ties keep their
/// first-seen order.
pub(crate) fn sort_patterns(patterns: &mut [SequencePattern]) {
    patterns.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| b.length.cmp(&a.length)));
}

/// Mine every repeated sequence of `min_length..=5` tool calls that occurs at
/// least `min_occurrences` times.
///
/// `min_length` below 1 is treated as 1. `min_occurrences` must be at least 1.
#[instrument(skip(entries), fields(entries = entries.len()))]
pub fn detect_tool_sequences(
    entries: &[SessionEntry],
    min_length: usize,
    min_occurrences: usize,
) -> Result<Vec<SequencePattern>> {
    if min_occurrences < 1 {
        return Err(MetaError::invalid_argument(
            "min_occurrences",
            "minOccurrences must be at least 1",
        ));
    }

    let calls = turn_ordered_calls(entries, true);

    let mut patterns: Vec<SequencePattern> = mine_windows(&calls, min_length)
        .into_iter()
        .filter(|(_, windows)| windows.len() >= min_occurrences)
        .map(|(key, windows)| build_pattern(key, &calls, &windows))
        .collect();
    sort_patterns(&mut patterns);

    debug!(calls = calls.len(), patterns = patterns.len(), "Detected tool sequences");
    Ok(patterns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentBlock, Message, ToolUse};
    use pretty_assertions::assert_eq;

    fn tool_entries(tools: &[&str]) -> Vec<SessionEntry> {
        tools
            .iter()
            .enumerate()
            .map(|(i, tool)| SessionEntry {
                entry_type: "assistant".into(),
                uuid: format!("a{i}"),
                timestamp: format!("2025-10-02T10:{:02}:00Z", i * 2),
                message: Some(Message {
                    role: "assistant".into(),
                    content: vec![ContentBlock::ToolUse(ToolUse {
                        id: format!("t{i}"),
                        name: (*tool).to_string(),
                        ..ToolUse::default()
                    })],
                    ..Message::default()
                }),
                ..SessionEntry::default()
            })
            .collect()
    }

    #[test]
    fn test_read_edit_bash_repeated() {
        let entries = tool_entries(&["Read", "Edit", "Bash", "Read", "Edit", "Bash", "Read", "Edit", "Bash"]);
        let patterns = detect_tool_sequences(&entries, 3, 3).unwrap();

        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].pattern, "Read → Edit → Bash");
        assert_eq!(patterns[0].count, 3);
        assert_eq!(patterns[0].length, 3);

        let starts: Vec<usize> = patterns[0].occurrences.iter().map(|o| o.start_turn).collect();
        assert_eq!(starts, vec![1, 4, 7]);
        assert_eq!(patterns[0].occurrences[0].end_turn, 3);
        assert_eq!(patterns[0].occurrences[0].tools.len(), 3);
        // 10:00 .. 10:16
        assert_eq!(patterns[0].time_span_min, 16);
    }

    #[test]
    fn test_overlapping_lengths_counted_independently() {
        let entries = tool_entries(&["Read"; 6]);
        let patterns = detect_tool_sequences(&entries, 2, 1).unwrap();

        let counts: Vec<(usize, usize)> = patterns.iter().map(|p| (p.length, p.count)).collect();
        assert_eq!(counts, vec![(2, 5), (3, 4), (4, 3), (5, 2)]);
    }

    #[test]
    fn test_sort_ties_by_length() {
        let entries = tool_entries(&["Read", "Edit", "Read", "Edit"]);
        let patterns = detect_tool_sequences(&entries, 2, 1).unwrap();

        assert_eq!(patterns[0].pattern, "Read → Edit");
        assert_eq!(patterns[0].count, 2);
        // count 1 patterns, longest first
        assert_eq!(patterns[1].length, 4);
    }

    #[test]
    fn test_min_length_clamped() {
        let entries = tool_entries(&["Read", "Read"]);
        let patterns = detect_tool_sequences(&entries, 0, 2).unwrap();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].pattern, "Read");
        assert_eq!(patterns[0].length, 1);
    }

    #[test]
    fn test_fewer_calls_than_min_length() {
        let entries = tool_entries(&["Read"]);
        assert!(detect_tool_sequences(&entries, 2, 1).unwrap().is_empty());
    }

    #[test]
    fn test_zero_min_occurrences_rejected() {
        let entries = tool_entries(&["Read", "Edit"]);
        let err = detect_tool_sequences(&entries, 2, 0).unwrap_err();
        assert!(matches!(err, MetaError::InvalidArgument { ref name, .. } if name == "min_occurrences"));
        assert_eq!(err.exit_code(), crate::error::exit_codes::EXIT_USAGE_ERROR);
    }

    #[test]
    fn test_parse_sequence_pattern() {
        assert_eq!(parse_sequence_pattern("Read → Edit → Bash"), vec!["Read", "Edit", "Bash"]);
        assert_eq!(parse_sequence_pattern("Read->Edit -> Bash"), vec!["Read", "Edit", "Bash"]);
        assert_eq!(parse_sequence_pattern(" → Read → "), vec!["Read"]);
        assert!(parse_sequence_pattern("").is_empty());
    }

    #[test]
    fn test_time_span_ignores_unparsable() {
        let mut entries = tool_entries(&["Read", "Edit", "Read", "Edit"]);
        entries[0].timestamp = "garbage".into();
        let patterns = detect_tool_sequences(&entries, 2, 2).unwrap();
        // windows: (Read,Edit)@0 and @2; endpoints 10:02, 10:04, 10:06
        assert_eq!(patterns[0].time_span_min, 4);
    }
}
