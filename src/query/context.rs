//! Turns surrounding each occurrence of an error signature.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::analytics::calculate_error_signature;
use crate::error::{MetaError, Result};
use crate::model::{extract_tool_calls, SessionEntry, ToolCall, STATUS_ERROR};
use crate::turns::TurnIndex;
use crate::util::{truncate_chars, unix_seconds};

/// Characters kept in a [`TurnPreview`].
pub const PREVIEW_CHARS: usize = 100;

/// Every occurrence of one error signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextQuery {
    /// The signature searched for.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_signature: String,
    /// Occurrences in tool-call order.
    pub occurrences: Vec<ContextOccurrence>,
}

/// One failing call and the turns around it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextOccurrence {
    /// Turn of the failing call.
    pub turn: usize,
    /// Up to `window` turns before.
    pub context_before: Vec<TurnPreview>,
    /// The failure.
    pub error_turn: ErrorDetail,
    /// Up to `window` turns after.
    pub context_after: Vec<TurnPreview>,
}

/// Brief view of a turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnPreview {
    /// Turn number.
    pub turn: usize,
    /// Message role.
    pub role: String,
    /// First non-blank text, trimmed and cut to 100 characters.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub preview: String,
    /// Tools invoked.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
    /// Unix seconds; 0 if unparsable.
    pub timestamp: i64,
}

impl TurnPreview {
    fn from_entry(entry: &SessionEntry, turn: usize) -> Self {
        let mut preview = Self {
            turn,
            timestamp: unix_seconds(&entry.timestamp).unwrap_or(0),
            ..Self::default()
        };
        if let Some(message) = &entry.message {
            preview.role = message.role.clone();
            preview.preview = message
                .texts()
                .map(str::trim)
                .find(|t| !t.is_empty())
                .map(|t| truncate_chars(t, PREVIEW_CHARS))
                .unwrap_or_default();
            preview.tools = message.tool_uses().map(|t| t.name.clone()).collect();
        }
        preview
    }
}

/// The failing call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Turn of the call.
    pub turn: usize,
    /// Tool name.
    pub tool: String,
    /// `command` input, if any.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,
    /// Error text.
    pub error: String,
    /// `file_path` input, if any.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,
    /// Unix seconds; 0 if unparsable.
    pub timestamp: i64,
}

impl ErrorDetail {
    fn from_call(call: &ToolCall, turn: usize) -> Self {
        Self {
            turn,
            tool: call.tool_name.clone(),
            command: call.input_str("command").unwrap_or_default().to_string(),
            error: call.error.clone(),
            file: call.input_str("file_path").unwrap_or_default().to_string(),
            timestamp: unix_seconds(&call.timestamp).unwrap_or(0),
        }
    }
}

/// Find every failed call whose signature is `error_signature` and attach
/// up to `window` turns of context on each side.
///
/// # Errors
///
/// Returns [`MetaError::InvalidArgument`] if `window` is negative.
#[instrument(skip(entries), fields(entries = entries.len()))]
pub fn build_context_query(entries: &[SessionEntry], error_signature: &str, window: i64) -> Result<ContextQuery> {
    let window = usize::try_from(window)
        .map_err(|_| MetaError::invalid_argument("window", "window size must be non-negative"))?;

    let turn_index = TurnIndex::build(entries);
    let by_turn: BTreeMap<usize, &SessionEntry> = entries
        .iter()
        .filter_map(|e| turn_index.get(&e.uuid).map(|turn| (turn, e)))
        .collect();
    let previews = |from: usize, to: usize| -> Vec<TurnPreview> {
        if from > to {
            return Vec::new();
        }
        by_turn
            .range(from..=to)
            .map(|(turn, entry)| TurnPreview::from_entry(entry, *turn))
            .collect()
    };

    let occurrences: Vec<ContextOccurrence> = extract_tool_calls(entries)
        .iter()
        .filter(|call| call.status == STATUS_ERROR && !call.error.is_empty())
        .filter(|call| calculate_error_signature(&call.tool_name, &call.error) == error_signature)
        .filter_map(|call| {
            let turn = turn_index.get(&call.uuid)?;
            Some(ContextOccurrence {
                turn,
                context_before: previews(turn.saturating_sub(window), turn.saturating_sub(1)),
                error_turn: ErrorDetail::from_call(call, turn),
                context_after: previews(turn + 1, turn + window),
            })
        })
        .collect();

    debug!(occurrences = occurrences.len(), "Built error context");
    Ok(ContextQuery {
        error_signature: error_signature.to_string(),
        occurrences,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::JsonlParser;
    use pretty_assertions::assert_eq;

    const SESSION: &str = r#"{"type":"user","uuid":"u1","timestamp":"2025-10-02T10:00:00Z","message":{"role":"user","content":"   run the tests please   "}}
{"type":"assistant","uuid":"a1","timestamp":"2025-10-02T10:00:10Z","message":{"role":"assistant","content":[{"type":"text","text":""},{"type":"text","text":"Running them."},{"type":"tool_use","id":"t1","name":"Bash","input":{"command":"cargo test"}}]}}
{"type":"user","uuid":"r1","timestamp":"2025-10-02T10:00:20Z","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"t1","content":"error[E0432]: unresolved import","is_error":true}]}}
{"type":"file-history-snapshot","uuid":"f1","timestamp":"2025-10-02T10:00:21Z"}
{"type":"assistant","uuid":"a2","timestamp":"2025-10-02T10:00:30Z","message":{"role":"assistant","content":[{"type":"tool_use","id":"t2","name":"Edit","input":{"file_path":"src/lib.rs"}},{"type":"tool_use","id":"t3","name":"Bash","input":{"command":"cargo test"}}]}}
{"type":"user","uuid":"r2","timestamp":"2025-10-02T10:00:40Z","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"t2","content":"ok"},{"type":"tool_result","tool_use_id":"t3","content":"error[E0432]: unresolved import","is_error":true}]}}"#;

    fn entries() -> Vec<SessionEntry> {
        JsonlParser::new().parse_str(SESSION).unwrap()
    }

    fn signature() -> String {
        calculate_error_signature("Bash", "error[E0432]: unresolved import")
    }

    #[test]
    fn test_occurrences_with_context() {
        let query = build_context_query(&entries(), &signature(), 1).unwrap();
        assert_eq!(query.error_signature, signature());
        assert_eq!(query.occurrences.len(), 2);

        let first = &query.occurrences[0];
        assert_eq!(first.turn, 2);
        assert_eq!(
            first.context_before,
            vec![TurnPreview {
                turn: 1,
                role: "user".into(),
                preview: "run the tests please".into(),
                tools: Vec::new(),
                timestamp: 1_759_399_200,
            }]
        );
        assert_eq!(
            first.error_turn,
            ErrorDetail {
                turn: 2,
                tool: "Bash".into(),
                command: "cargo test".into(),
                error: "error[E0432]: unresolved import".into(),
                file: String::new(),
                timestamp: 1_759_399_210,
            }
        );
        assert_eq!(first.context_after.len(), 1);
        assert_eq!(first.context_after[0].turn, 3);

        let second = &query.occurrences[1];
        assert_eq!(second.turn, 4);
        assert_eq!(second.context_before[0].turn, 3);
        assert_eq!(second.context_before[0].preview, "");
        assert_eq!(second.context_after[0].turn, 5);
    }

    #[test]
    fn test_preview_skips_blank_text() {
        let query = build_context_query(&entries(), &signature(), 3).unwrap();
        let before = &query.occurrences[1].context_before;
        let turns: Vec<usize> = before.iter().map(|p| p.turn).collect();
        assert_eq!(turns, vec![1, 2, 3]);
        assert_eq!(before[1].preview, "Running them.");
        assert_eq!(before[1].tools, vec!["Bash"]);
    }

    #[test]
    fn test_zero_window() {
        let query = build_context_query(&entries(), &signature(), 0).unwrap();
        assert_eq!(query.occurrences.len(), 2);
        assert!(query.occurrences[0].context_before.is_empty());
        assert!(query.occurrences[0].context_after.is_empty());
    }

    #[test]
    fn test_first_turn_has_no_before() {
        let jsonl = r#"{"type":"assistant","uuid":"a1","message":{"role":"assistant","content":[{"type":"tool_use","id":"t1","name":"Read","input":{"file_path":"x.rs"}}]}}
{"type":"user","uuid":"r1","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"t1","content":"not found","is_error":true}]}}"#;
        let entries = JsonlParser::new().parse_str(jsonl).unwrap();
        let sig = calculate_error_signature("Read", "not found");
        let query = build_context_query(&entries, &sig, 2).unwrap();
        assert_eq!(query.occurrences.len(), 1);
        assert!(query.occurrences[0].context_before.is_empty());
        assert_eq!(query.occurrences[0].error_turn.file, "x.rs");
        assert_eq!(query.occurrences[0].error_turn.timestamp, 0);
    }

    #[test]
    fn test_unknown_signature() {
        let query = build_context_query(&entries(), "0000000000000000", 2).unwrap();
        assert!(query.occurrences.is_empty());
    }

    #[test]
    fn test_negative_window_rejected() {
        let err = build_context_query(&entries(), &signature(), -1).unwrap_err();
        assert!(matches!(err, MetaError::InvalidArgument { .. }));
    }
}
