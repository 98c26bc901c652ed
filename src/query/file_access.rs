//! Access history of a single file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{MetaError, Result};
use crate::model::{extract_tool_calls, FileAction, SessionEntry};
use crate::turns::TurnIndex;
use crate::util::unix_seconds;

/// Every Read, Edit and Write on one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAccessQuery {
    /// The queried path.
    pub file: String,
    /// Number of accesses.
    pub total_accesses: usize,
    /// Accesses per action.
    pub operations: BTreeMap<FileAction, usize>,
    /// Accesses by turn.
    pub timeline: Vec<FileAccessEvent>,
    /// Minutes between the first and last access.
    #[serde(rename = "time_span_minutes")]
    pub time_span_min: i64,
}

/// One access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAccessEvent {
    /// Turn of the issuing entry.
    pub turn: usize,
    /// What the tool did.
    pub action: FileAction,
    /// Unix seconds; 0 if unparsable.
    pub timestamp: i64,
}

/// Whether an accessed path is the queried file. A query without `/` also
/// matches by basename.
#[must_use]
pub fn matches_file(accessed: &str, query: &str) -> bool {
    accessed == query || (!query.contains('/') && accessed.rsplit('/').next() == Some(query))
}

/// Collect the access history of `file_path`.
///
/// # Errors
///
/// Returns [`MetaError::MissingParameter`] if `file_path` is empty.
#[instrument(skip(entries), fields(entries = entries.len()))]
pub fn build_file_access_query(entries: &[SessionEntry], file_path: &str) -> Result<FileAccessQuery> {
    if file_path.is_empty() {
        return Err(MetaError::MissingParameter {
            name: "file path".to_string(),
        });
    }

    let turn_index = TurnIndex::build(entries);
    let mut timeline: Vec<FileAccessEvent> = extract_tool_calls(entries)
        .iter()
        .filter(|call| call.file_path().is_some_and(|p| matches_file(p, file_path)))
        .filter_map(|call| {
            Some(FileAccessEvent {
                action: FileAction::from_tool_name(&call.tool_name)?,
                turn: turn_index.get(&call.uuid)?,
                timestamp: unix_seconds(&call.timestamp).unwrap_or(0),
            })
        })
        .collect();
    timeline.sort_by_key(|event| event.turn);

    let mut operations = BTreeMap::new();
    for event in &timeline {
        *operations.entry(event.action).or_insert(0) += 1;
    }
    let time_span_min = match (timeline.first(), timeline.last()) {
        (Some(first), Some(last)) if timeline.len() >= 2 => (last.timestamp - first.timestamp) / 60,
        _ => 0,
    };

    debug!(accesses = timeline.len(), "Built file access history");
    Ok(FileAccessQuery {
        file: file_path.to_string(),
        total_accesses: timeline.len(),
        operations,
        timeline,
        time_span_min,
    })
}
