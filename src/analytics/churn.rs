//! File churn: files read and modified over and over.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::model::{extract_tool_calls, FileAction, SessionEntry};
use crate::util::unix_seconds;

/// Access counts for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChurnDetail {
    /// File path as passed to the tool.
    pub file: String,
    /// Read calls.
    pub read_count: usize,
    /// Edit and NotebookEdit calls.
    pub edit_count: usize,
    /// Write calls.
    pub write_count: usize,
    /// All accesses.
    pub total_accesses: usize,
    /// Minutes between first and last access.
    #[serde(rename = "time_span_minutes")]
    pub time_span_min: i64,
    /// Unix time of the first access with a parsable timestamp, 0 if none.
    pub first_access: i64,
    /// Unix time of the last access with a parsable timestamp, 0 if none.
    pub last_access: i64,
}

impl FileChurnDetail {
    fn record(&mut self, action: FileAction, unix_time: Option<i64>) {
        self.total_accesses += 1;
        match action {
            FileAction::Read => self.read_count += 1,
            FileAction::Edit => self.edit_count += 1,
            FileAction::Write => self.write_count += 1,
        }
        if let Some(ts) = unix_time {
            if self.first_access == 0 || ts < self.first_access {
                self.first_access = ts;
            }
            if ts > self.last_access {
                self.last_access = ts;
            }
        }
    }
}

/// Files accessed at least `threshold` times through Read, Edit, Write or
/// NotebookEdit, most accessed first.
///
/// The path comes from `file_path`, `notebook_path` or `path`, first
/// non-empty wins. Equal totals are ordered by path.
#[instrument(skip(entries), fields(entries = entries.len()))]
pub fn detect_file_churn(entries: &[SessionEntry], threshold: usize) -> Vec<FileChurnDetail> {
    let timestamps: HashMap<&str, &str> = entries
        .iter()
        .map(|e| (e.uuid.as_str(), e.timestamp.as_str()))
        .collect();

    let mut files: IndexMap<String, FileChurnDetail> = IndexMap::new();
    for call in extract_tool_calls(entries) {
        let (Some(path), Some(action)) = (call.file_path(), FileAction::from_tool_name(&call.tool_name)) else {
            continue;
        };
        let unix_time = timestamps
            .get(call.uuid.as_str())
            .and_then(|ts| unix_seconds(ts));

        files
            .entry(path.to_string())
            .or_insert_with(|| FileChurnDetail {
                file: path.to_string(),
                ..FileChurnDetail::default()
            })
            .record(action, unix_time);
    }

    let mut churn: Vec<FileChurnDetail> = files
        .into_values()
        .filter(|detail| detail.total_accesses >= threshold)
        .map(|mut detail| {
            detail.time_span_min = (detail.last_access - detail.first_access).max(0) / 60;
            detail
        })
        .collect();

    churn.sort_by(|a, b| b.total_accesses.cmp(&a.total_accesses).then_with(|| a.file.cmp(&b.file)));
    debug!(files = churn.len(), threshold, "Detected file churn");
    churn
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentBlock, Message, ToolUse};
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    fn file_entry(i: usize, tool: &str, path: &str) -> SessionEntry {
        let mut tool_use = ToolUse {
            id: format!("t{i}"),
            name: tool.to_string(),
            ..ToolUse::default()
        };
        tool_use.input.insert("file_path".into(), Value::from(path));
        SessionEntry {
            entry_type: "assistant".into(),
            uuid: format!("a{i}"),
            timestamp: format!("2025-10-02T10:{:02}:00Z", i),
            message: Some(Message {
                role: "assistant".into(),
                content: vec![ContentBlock::ToolUse(tool_use)],
                ..Message::default()
            }),
            ..SessionEntry::default()
        }
    }

    fn fixture() -> Vec<SessionEntry> {
        let accesses = [
            ("Read", "test.js"),
            ("Edit", "test.js"),
            ("Read", "test.js"),
            ("Edit", "test.js"),
            ("Read", "other.js"),
            ("Read", "test.js"),
            ("Edit", "test.js"),
        ];
        accesses
            .iter()
            .enumerate()
            .map(|(i, (tool, path))| file_entry(i, tool, path))
            .collect()
    }

    #[test]
    fn test_threshold_five() {
        let churn = detect_file_churn(&fixture(), 5);

        assert_eq!(churn.len(), 1);
        let detail = &churn[0];
        assert_eq!(detail.file, "test.js");
        assert_eq!(detail.read_count, 3);
        assert_eq!(detail.edit_count, 3);
        assert_eq!(detail.write_count, 0);
        assert_eq!(detail.total_accesses, 6);
        assert_eq!(detail.time_span_min, 6);
        assert_eq!(detail.last_access - detail.first_access, 360);
    }

    #[test]
    fn test_low_threshold_sorted() {
        let churn = detect_file_churn(&fixture(), 1);
        let files: Vec<&str> = churn.iter().map(|d| d.file.as_str()).collect();
        assert_eq!(files, vec!["test.js", "other.js"]);
    }

    #[test]
    fn test_notebook_edit_counts_as_edit() {
        let entries = vec![file_entry(0, "NotebookEdit", "nb.ipynb"), file_entry(1, "Write", "nb.ipynb")];
        let churn = detect_file_churn(&entries, 2);
        assert_eq!(churn[0].edit_count, 1);
        assert_eq!(churn[0].write_count, 1);
    }

    #[test]
    fn test_non_file_tools_ignored() {
        let entries = vec![file_entry(0, "Grep", "src"), file_entry(1, "Glob", "src")];
        assert!(detect_file_churn(&entries, 1).is_empty());
    }
}
