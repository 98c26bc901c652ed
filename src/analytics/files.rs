//! Per-file operation statistics.

use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::ValidationError;
use crate::model::{ToolCall, STATUS_ERROR};

/// Input keys checked for a path, in this order.
const STATS_PATH_KEYS: &[&str] = &["file_path", "path", "notebook_path"];

/// Operation counts for one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileStats {
    /// File path.
    pub file_path: String,
    /// Read calls.
    pub read_count: usize,
    /// Edit and NotebookEdit calls.
    pub edit_count: usize,
    /// Write calls.
    pub write_count: usize,
    /// Calls with status `error`.
    pub error_count: usize,
    /// All calls naming this path, whatever the tool.
    #[serde(rename = "total_ops")]
    pub total_ops: usize,
    /// `error_count / total_ops`.
    pub error_rate: f64,
}

/// Sort key for [`sort_file_stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileStatsSort {
    /// Read calls.
    ReadCount,
    /// Edit calls.
    EditCount,
    /// Write calls.
    WriteCount,
    /// Failed calls.
    ErrorCount,
    /// Failure fraction.
    ErrorRate,
    /// All calls.
    #[default]
    TotalOps,
}

impl FileStatsSort {
    const VALID: &'static [&'static str] = &[
        "read_count",
        "edit_count",
        "write_count",
        "error_count",
        "error_rate",
        "total_ops",
    ];
}

impl FromStr for FileStatsSort {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "read_count" => Ok(Self::ReadCount),
            "edit_count" => Ok(Self::EditCount),
            "write_count" => Ok(Self::WriteCount),
            "error_count" => Ok(Self::ErrorCount),
            "error_rate" => Ok(Self::ErrorRate),
            "total_ops" | "total" => Ok(Self::TotalOps),
            _ => Err(ValidationError::new("sort_by", s, Self::VALID)),
        }
    }
}

fn stats_path(call: &ToolCall) -> Option<&str> {
    STATS_PATH_KEYS
        .iter()
        .find_map(|key| call.input_str(key))
        .filter(|path| !path.is_empty())
}

/// Collect per-file counts from every tool call that names a path, busiest
/// file first.
#[instrument(skip_all, fields(tool_calls = tool_calls.len()))]
pub fn analyze_file_stats(tool_calls: &[ToolCall]) -> Vec<FileStats> {
    let mut files: IndexMap<&str, FileStats> = IndexMap::new();

    for call in tool_calls {
        let Some(path) = stats_path(call) else {
            continue;
        };
        let stats = files.entry(path).or_insert_with(|| FileStats {
            file_path: path.to_string(),
            ..FileStats::default()
        });

        match call.tool_name.as_str() {
            "Read" => stats.read_count += 1,
            "Edit" | "NotebookEdit" => stats.edit_count += 1,
            "Write" => stats.write_count += 1,
            _ => {}
        }
        if call.status == STATUS_ERROR {
            stats.error_count += 1;
        }
        stats.total_ops += 1;
    }

    let mut results: Vec<FileStats> = files
        .into_values()
        .map(|mut stats| {
            stats.error_rate = stats.error_count as f64 / stats.total_ops as f64;
            stats
        })
        .collect();
    sort_file_stats(&mut results, FileStatsSort::TotalOps);

    debug!(files = results.len(), "Analyzed file statistics");
    results
}

/// Sort descending by `key`. Ties keep their current order.
pub fn sort_file_stats(stats: &mut [FileStats], key: FileStatsSort) {
    match key {
        FileStatsSort::ReadCount => stats.sort_by(|a, b| b.read_count.cmp(&a.read_count)),
        FileStatsSort::EditCount => stats.sort_by(|a, b| b.edit_count.cmp(&a.edit_count)),
        FileStatsSort::WriteCount => stats.sort_by(|a, b| b.write_count.cmp(&a.write_count)),
        FileStatsSort::ErrorCount => stats.sort_by(|a, b| b.error_count.cmp(&a.error_count)),
        FileStatsSort::ErrorRate => stats.sort_by(|a, b| b.error_rate.total_cmp(&a.error_rate)),
        FileStatsSort::TotalOps => stats.sort_by(|a, b| b.total_ops.cmp(&a.total_ops)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::Value;

    fn call(tool: &str, key: &str, path: &str, status: &str) -> ToolCall {
        let mut call = ToolCall {
            tool_name: tool.into(),
            status: status.into(),
            ..ToolCall::default()
        };
        call.input.insert(key.into(), Value::from(path));
        call
    }

    fn fixture() -> Vec<ToolCall> {
        vec![
            call("Read", "file_path", "src/main.rs", ""),
            call("Edit", "file_path", "src/main.rs", "error"),
            call("Edit", "file_path", "src/main.rs", ""),
            call("Write", "file_path", "README.md", ""),
            call("Grep", "path", "src", ""),
            call("NotebookEdit", "notebook_path", "nb.ipynb", "error"),
            ToolCall {
                tool_name: "Bash".into(),
                ..ToolCall::default()
            },
        ]
    }

    #[test]
    fn test_counts_per_file() {
        let stats = analyze_file_stats(&fixture());

        assert_eq!(stats.len(), 4);
        let main = &stats[0];
        assert_eq!(main.file_path, "src/main.rs");
        assert_eq!(main.read_count, 1);
        assert_eq!(main.edit_count, 2);
        assert_eq!(main.error_count, 1);
        assert_eq!(main.total_ops, 3);
        assert!((main.error_rate - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_file_tools_count_toward_total() {
        let stats = analyze_file_stats(&fixture());
        let src = stats.iter().find(|s| s.file_path == "src").unwrap();
        assert_eq!(src.total_ops, 1);
        assert_eq!(src.read_count + src.edit_count + src.write_count, 0);
    }

    #[test]
    fn test_notebook_edit_is_edit() {
        let stats = analyze_file_stats(&fixture());
        let nb = stats.iter().find(|s| s.file_path == "nb.ipynb").unwrap();
        assert_eq!(nb.edit_count, 1);
        assert_eq!(nb.error_rate, 1.0);
    }

    #[test]
    fn test_sort_by_error_rate() {
        let mut stats = analyze_file_stats(&fixture());
        sort_file_stats(&mut stats, FileStatsSort::ErrorRate);
        assert_eq!(stats[0].file_path, "nb.ipynb");
        assert_eq!(stats[1].file_path, "src/main.rs");
    }

    #[rstest]
    #[case("read_count", FileStatsSort::ReadCount)]
    #[case("error_rate", FileStatsSort::ErrorRate)]
    #[case("total", FileStatsSort::TotalOps)]
    fn test_sort_key_parse(#[case] input: &str, #[case] expected: FileStatsSort) {
        assert_eq!(input.parse::<FileStatsSort>().unwrap(), expected);
    }

    #[test]
    fn test_sort_key_rejects_unknown() {
        let err = "size".parse::<FileStatsSort>().unwrap_err();
        assert_eq!(err.field, "sort_by");
    }
}
