//! Repeated-error detection.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::signature::calculate_error_signature;
use crate::model::{SessionEntry, ToolCall};
use crate::turns::TurnIndex;
use crate::util::parse_timestamp;

/// Minimum occurrences for a signature to count as a pattern.
pub const MIN_PATTERN_OCCURRENCES: usize = 3;

/// Pattern type tag for repeated errors.
pub const PATTERN_TYPE_REPEATED: &str = "repeated_error";

/// An error signature that recurs within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPattern {
    /// Pattern identifier (the signature).
    pub pattern_id: String,
    /// Pattern type, currently always `repeated_error`.
    #[serde(rename = "type")]
    pub pattern_type: String,
    /// Number of failing calls sharing the signature.
    pub occurrences: usize,
    /// Error signature.
    pub signature: String,
    /// Tool that failed.
    pub tool_name: String,
    /// Error text of the first occurrence.
    pub error_text: String,
    /// Earliest timestamp among occurrences.
    pub first_seen: String,
    /// Latest timestamp among occurrences.
    pub last_seen: String,
    /// Seconds between first and last occurrence (0 if unparsable).
    pub time_span_seconds: i64,
    /// Where the pattern occurred.
    pub context: PatternContext,
}

/// Turns a pattern occurred in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternContext {
    /// UUID of the entry that issued each failing call.
    pub turn_uuids: Vec<String>,
    /// Turn number of each failing call whose entry is a message.
    pub turn_indices: Vec<usize>,
}

/// Group failing tool calls by signature and keep groups of three or more.
///
/// A call fails when its status is `error` or it carries error text.
/// Patterns are sorted by occurrence count, most frequent first; equal counts
/// keep the order in which the signature was first seen.
#[instrument(skip_all, fields(entries = entries.len(), tool_calls = tool_calls.len()))]
pub fn detect_error_patterns(entries: &[SessionEntry], tool_calls: &[ToolCall]) -> Vec<ErrorPattern> {
    let turn_index = TurnIndex::build(entries);
    let timestamps: HashMap<&str, &str> = entries
        .iter()
        .map(|e| (e.uuid.as_str(), e.timestamp.as_str()))
        .collect();

    let mut groups: IndexMap<String, Vec<&ToolCall>> = IndexMap::new();
    for call in tool_calls.iter().filter(|c| c.is_error()) {
        let signature = calculate_error_signature(&call.tool_name, &call.error);
        groups.entry(signature).or_default().push(call);
    }

    let mut patterns: Vec<ErrorPattern> = groups
        .into_iter()
        .filter(|(_, group)| group.len() >= MIN_PATTERN_OCCURRENCES)
        .map(|(signature, group)| build_pattern(signature, &group, &turn_index, &timestamps))
        .collect();

    patterns.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
    debug!(patterns = patterns.len(), "Detected error patterns");
    patterns
}

fn build_pattern(
    signature: String,
    group: &[&ToolCall],
    turn_index: &TurnIndex,
    timestamps: &HashMap<&str, &str>,
) -> ErrorPattern {
    let first = group[0];

    let context = PatternContext {
        turn_uuids: group.iter().map(|c| c.uuid.clone()).collect(),
        turn_indices: group.iter().filter_map(|c| turn_index.get(&c.uuid)).collect(),
    };

    let mut seen: Vec<&str> = group
        .iter()
        .map(|c| timestamps.get(c.uuid.as_str()).copied().unwrap_or(c.timestamp.as_str()))
        .filter(|ts| !ts.is_empty())
        .collect();
    seen.sort_unstable();

    let first_seen = seen.first().copied().unwrap_or_default();
    let last_seen = seen.last().copied().unwrap_or_default();
    let time_span_seconds = match (parse_timestamp(first_seen), parse_timestamp(last_seen)) {
        (Some(start), Some(end)) => (end - start).num_seconds(),
        _ => 0,
    };

    ErrorPattern {
        pattern_id: signature.clone(),
        pattern_type: PATTERN_TYPE_REPEATED.to_string(),
        occurrences: group.len(),
        signature,
        tool_name: first.tool_name.clone(),
        error_text: first.error.clone(),
        first_seen: first_seen.to_string(),
        last_seen: last_seen.to_string(),
        time_span_seconds,
        context,
    }
}
