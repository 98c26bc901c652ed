//! Session entries and the messages they carry.

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::content::{ContentBlock, ToolResult, ToolUse};
use super::null_as_default;

/// Entry type tag for user messages.
pub const ENTRY_TYPE_USER: &str = "user";
/// Entry type tag for assistant messages.
pub const ENTRY_TYPE_ASSISTANT: &str = "assistant";
/// Entry type tag for file history snapshots.
pub const ENTRY_TYPE_FILE_SNAPSHOT: &str = "file-history-snapshot";

/// One line of a Claude Code session transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntry {
    /// Entry type: "user", "assistant", "file-history-snapshot", etc.
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub entry_type: String,

    /// ISO 8601 timestamp.
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,

    /// Unique entry identifier.
    #[serde(default, deserialize_with = "null_as_default")]
    pub uuid: String,

    /// Parent entry UUID (empty for roots).
    #[serde(default, deserialize_with = "null_as_default")]
    pub parent_uuid: String,

    /// Session identifier.
    #[serde(default, deserialize_with = "null_as_default")]
    pub session_id: String,

    /// Working directory.
    #[serde(default, deserialize_with = "null_as_default")]
    pub cwd: String,

    /// Claude Code version that wrote the entry.
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,

    /// Git branch at the time of the entry.
    #[serde(default, deserialize_with = "null_as_default")]
    pub git_branch: String,

    /// Message payload (user and assistant entries only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,

    /// Unknown fields for forward compatibility.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl SessionEntry {
    /// Whether this entry is a conversational message (user or assistant).
    #[must_use]
    pub fn is_message(&self) -> bool {
        self.entry_type == ENTRY_TYPE_USER || self.entry_type == ENTRY_TYPE_ASSISTANT
    }

    /// Whether this is a user entry.
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.entry_type == ENTRY_TYPE_USER
    }

    /// Whether this is an assistant entry.
    #[must_use]
    pub fn is_assistant(&self) -> bool {
        self.entry_type == ENTRY_TYPE_ASSISTANT
    }

    /// Message role, if the entry carries a message.
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.message.as_ref().map(|m| m.role.as_str())
    }

    /// Content blocks of the message, empty if there is none.
    #[must_use]
    pub fn content(&self) -> &[ContentBlock] {
        self.message.as_ref().map_or(&[], |m| m.content.as_slice())
    }

    /// All text blocks concatenated without a separator.
    #[must_use]
    pub fn concatenated_text(&self) -> String {
        self.message.as_ref().map(Message::concatenated_text).unwrap_or_default()
    }
}

/// Message content of a user or assistant entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// API message ID (assistant messages).
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// "user" or "assistant".
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: String,

    /// Model identifier (assistant messages).
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub model: String,

    /// Content block array. A plain string is read as a single text block.
    #[serde(default, deserialize_with = "message_content")]
    pub content: Vec<ContentBlock>,

    /// Why generation stopped.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub stop_reason: String,

    /// Token statistics (`input_tokens`, `output_tokens`, cache counters).
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "IndexMap::is_empty")]
    pub usage: IndexMap<String, Value>,
}

impl Message {
    /// Iterate over text block payloads.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(ContentBlock::as_text)
    }

    /// Iterate over tool use blocks.
    pub fn tool_uses(&self) -> impl Iterator<Item = &ToolUse> {
        self.content.iter().filter_map(ContentBlock::as_tool_use)
    }

    /// Iterate over tool result blocks.
    pub fn tool_results(&self) -> impl Iterator<Item = &ToolResult> {
        self.content.iter().filter_map(ContentBlock::as_tool_result)
    }

    /// All text blocks concatenated without a separator.
    #[must_use]
    pub fn concatenated_text(&self) -> String {
        self.texts().collect()
    }

    /// Non-empty text blocks joined with newlines.
    #[must_use]
    pub fn joined_text(&self) -> String {
        self.texts().filter(|t| !t.is_empty()).collect::<Vec<_>>().join("\n")
    }

    /// Integer usage counter, 0 if absent or not a number.
    #[must_use]
    pub fn usage_count(&self, key: &str) -> u64 {
        self.usage.get(key).and_then(Value::as_f64).map_or(0, |v| v as u64)
    }
}

fn message_content<'de, D>(deserializer: D) -> Result<Vec<ContentBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::String(text) => Ok(vec![ContentBlock::text(text)]),
        value @ Value::Array(_) => serde_json::from_value(value).map_err(D::Error::custom),
        other => Err(D::Error::custom(format!(
            "message content must be a string or an array, got {other}"
        ))),
    }
}
