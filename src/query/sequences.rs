//! Tool-sequence query: a named pattern or every repeated one.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::analytics::sequences::{
    build_pattern, find_pattern, mine_windows, parse_sequence_pattern, sort_patterns, turn_ordered_calls,
    MIN_SEQUENCE_LENGTH,
};
use crate::analytics::SequencePattern;
use crate::error::{MetaError, Result};
use crate::model::SessionEntry;

/// Result wrapper, serialized as `{"sequences": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSequenceQuery {
    /// Matching patterns, most frequent first.
    pub sequences: Vec<SequencePattern>,
}

/// Find tool sequences occurring at least `min_occurrences` times.
///
/// With a `pattern` such as `"Read → Edit"` (or `"Read -> Edit"`) only that
/// sequence is searched and it keeps the pattern text as given. Without one,
/// every sequence of 2 to 5 calls is mined. `include_builtin = false` drops
/// built-in tools before windowing.
///
/// # Errors
///
/// Returns [`MetaError::InvalidArgument`] if `min_occurrences` is 0.
#[instrument(skip(entries), fields(entries = entries.len()))]
pub fn build_tool_sequence_query(
    entries: &[SessionEntry],
    min_occurrences: usize,
    pattern: Option<&str>,
    include_builtin: bool,
) -> Result<ToolSequenceQuery> {
    if min_occurrences < 1 {
        return Err(MetaError::invalid_argument(
            "min_occurrences",
            "minOccurrences must be at least 1",
        ));
    }

    let calls = turn_ordered_calls(entries, include_builtin);
    let sequences = match pattern.filter(|p| !p.trim().is_empty()) {
        Some(pattern) => {
            let windows = find_pattern(&calls, &parse_sequence_pattern(pattern));
            let found = build_pattern(pattern.to_string(), &calls, &windows);
            if found.count >= min_occurrences {
                vec![found]
            } else {
                Vec::new()
            }
        }
        None => {
            let mut patterns: Vec<SequencePattern> = mine_windows(&calls, MIN_SEQUENCE_LENGTH)
                .into_iter()
                .filter(|(_, windows)| windows.len() >= min_occurrences)
                .map(|(key, windows)| build_pattern(key, &calls, &windows))
                .collect();
            sort_patterns(&mut patterns);
            patterns
        }
    };

    debug!(sequences = sequences.len(), "Built tool sequence query");
    Ok(ToolSequenceQuery { sequences })
}
