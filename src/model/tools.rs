//! Tool names Claude Code ships with, and how file tools are classified.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tools built into Claude Code.
///
/// Sequence mining can exclude these to surface workflows built from MCP and
/// custom tools.
pub const BUILTIN_TOOLS: &[&str] = &[
    "Bash",
    "Read",
    "Edit",
    "Write",
    "Glob",
    "Grep",
    "TodoWrite",
    "Task",
    "WebFetch",
    "WebSearch",
    "SlashCommand",
    "BashOutput",
    "NotebookEdit",
    "ExitPlanMode",
];

/// Check whether a tool name is one of [`BUILTIN_TOOLS`].
#[must_use]
pub fn is_builtin_tool(name: &str) -> bool {
    BUILTIN_TOOLS.contains(&name)
}

/// Input keys that carry a file path, in lookup order.
pub const FILE_PATH_KEYS: &[&str] = &["file_path", "notebook_path", "path"];

/// Kind of file access a tool performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FileAction {
    /// File read.
    Read,
    /// In-place modification (Edit, NotebookEdit).
    Edit,
    /// Whole-file write.
    Write,
}

impl FileAction {
    /// Classify a tool name. Tools that do not touch files yield `None`.
    #[must_use]
    pub fn from_tool_name(name: &str) -> Option<Self> {
        match name {
            "Read" => Some(Self::Read),
            "Edit" | "NotebookEdit" => Some(Self::Edit),
            "Write" => Some(Self::Write),
            _ => None,
        }
    }

    /// Display name, matching the tool name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "Read",
            Self::Edit => "Edit",
            Self::Write => "Write",
        }
    }

    /// Whether the action modifies the file.
    #[must_use]
    pub const fn is_modification(&self) -> bool {
        matches!(self, Self::Edit | Self::Write)
    }
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
