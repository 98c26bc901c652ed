//! Tool calls: `tool_use` blocks joined with their `tool_result`.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use super::content::{ToolResult, ToolUse};
use super::entry::SessionEntry;
use super::tools::FILE_PATH_KEYS;

/// Status value of a failed tool call.
pub const STATUS_ERROR: &str = "error";

/// A tool invocation joined with its outcome.
///
/// Calls whose result never arrived (truncated sessions, interrupted tools)
/// have empty `output`, `status` and `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// UUID of the entry that issued the call.
    pub uuid: String,
    /// Tool name.
    pub tool_name: String,
    /// Tool input parameters.
    pub input: IndexMap<String, Value>,
    /// Result content.
    pub output: String,
    /// Execution status ("success", "error" or empty).
    pub status: String,
    /// Error text, if the call failed.
    pub error: String,
    /// Timestamp of the issuing entry.
    pub timestamp: String,
}

impl ToolCall {
    fn from_parts(entry: &SessionEntry, tool_use: &ToolUse, result: Option<&ToolResult>) -> Self {
        let mut call = Self {
            uuid: entry.uuid.clone(),
            tool_name: tool_use.name.clone(),
            input: tool_use.input.clone(),
            timestamp: entry.timestamp.clone(),
            ..Self::default()
        };
        if let Some(result) = result {
            call.output = result.content.clone();
            call.status = result.effective_status().to_string();
            call.error = result.effective_error().to_string();
        }
        call
    }

    /// String-valued input parameter.
    #[must_use]
    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.input.get(key).and_then(Value::as_str)
    }

    /// Path of the file this call touches: the first non-empty of
    /// `file_path`, `notebook_path` and `path`.
    #[must_use]
    pub fn file_path(&self) -> Option<&str> {
        FILE_PATH_KEYS
            .iter()
            .filter_map(|key| self.input_str(key))
            .find(|path| !path.is_empty())
    }

    /// First line of the command, for Bash calls.
    #[must_use]
    pub fn bash_command(&self) -> Option<&str> {
        if self.tool_name != "Bash" {
            return None;
        }
        self.input_str("command").and_then(|cmd| cmd.lines().next())
    }

    /// Whether the call failed: status "error" or a recorded error text.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status == STATUS_ERROR || !self.error.is_empty()
    }
}

/// Join every `tool_use` block with the `tool_result` that references it.
///
/// Left join: each `tool_use` yields exactly one [`ToolCall`], matched or not.
/// Output follows the file order of the `tool_use` blocks. A repeated
/// `tool_use` id keeps its first position with the last definition, and the
/// last result for an id wins.
#[instrument(skip(entries), fields(entries = entries.len()))]
pub fn extract_tool_calls(entries: &[SessionEntry]) -> Vec<ToolCall> {
    let mut uses: IndexMap<&str, (&SessionEntry, &ToolUse)> = IndexMap::new();
    let mut results: HashMap<&str, &ToolResult> = HashMap::new();

    for entry in entries {
        let Some(message) = &entry.message else {
            continue;
        };
        for tool_use in message.tool_uses() {
            uses.insert(tool_use.id.as_str(), (entry, tool_use));
        }
        for result in message.tool_results() {
            results.insert(result.tool_use_id.as_str(), result);
        }
    }

    let calls: Vec<ToolCall> = uses
        .iter()
        .map(|(id, (entry, tool_use))| ToolCall::from_parts(entry, tool_use, results.get(id).copied()))
        .collect();

    debug!(calls = calls.len(), results = results.len(), "Extracted tool calls");
    calls
}
