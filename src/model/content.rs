//! Content block types for Claude Code JSONL logs.
//!
//! Three block types carry data the analyses need:
//! - `text`: Natural language text
//! - `tool_use`: Tool invocation requests
//! - `tool_result`: Tool execution outcomes
//!
//! Any other block (`thinking`, `image`, future additions) is kept as
//! [`ContentBlock::Other`] with only its type tag.

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::null_as_default;

/// Content block - one of three known types, or an unknown tag.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    /// Natural language text.
    Text(TextBlock),

    /// Tool invocation request.
    ToolUse(ToolUse),

    /// Tool execution outcome.
    ToolResult(ToolResult),

    /// Block type this crate does not interpret.
    Other {
        /// The block's `type` tag.
        block_type: String,
    },
}

impl ContentBlock {
    /// Create a text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextBlock { text: text.into() })
    }

    /// Get the type name of this content block.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Text(_) => "text",
            Self::ToolUse(_) => "tool_use",
            Self::ToolResult(_) => "tool_result",
            Self::Other { block_type } => block_type,
        }
    }

    /// Text payload, if this is a text block.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(&t.text),
            _ => None,
        }
    }

    /// Tool use payload, if this is a tool use block.
    #[must_use]
    pub const fn as_tool_use(&self) -> Option<&ToolUse> {
        match self {
            Self::ToolUse(t) => Some(t),
            _ => None,
        }
    }

    /// Tool result payload, if this is a tool result block.
    #[must_use]
    pub const fn as_tool_result(&self) -> Option<&ToolResult> {
        match self {
            Self::ToolResult(r) => Some(r),
            _ => None,
        }
    }

    /// Check if this is a text block.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Check if this is a tool use block.
    #[must_use]
    pub const fn is_tool_use(&self) -> bool {
        matches!(self, Self::ToolUse(_))
    }

    /// Check if this is a tool result block.
    #[must_use]
    pub const fn is_tool_result(&self) -> bool {
        matches!(self, Self::ToolResult(_))
    }
}

impl<'de> Deserialize<'de> for ContentBlock {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let block_type = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let block = match block_type.as_str() {
            "text" => Self::Text(serde_json::from_value(value).map_err(D::Error::custom)?),
            "tool_use" => Self::ToolUse(serde_json::from_value(value).map_err(D::Error::custom)?),
            "tool_result" => Self::ToolResult(serde_json::from_value(value).map_err(D::Error::custom)?),
            _ => Self::Other { block_type },
        };
        Ok(block)
    }
}

impl Serialize for ContentBlock {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        #[serde(tag = "type", rename_all = "snake_case")]
        enum Tagged<'a> {
            Text(&'a TextBlock),
            ToolUse(&'a ToolUse),
            ToolResult(&'a ToolResult),
        }

        match self {
            Self::Text(t) => Tagged::Text(t).serialize(serializer),
            Self::ToolUse(t) => Tagged::ToolUse(t).serialize(serializer),
            Self::ToolResult(r) => Tagged::ToolResult(r).serialize(serializer),
            Self::Other { block_type } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("type", block_type)?;
                map.end()
            }
        }
    }
}

/// Text content block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// The text content.
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
}

/// Tool use content block - tool invocation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolUse {
    /// Tool use ID, referenced by the matching result's `tool_use_id`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,

    /// Tool name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// Tool input parameters.
    #[serde(default, deserialize_with = "null_as_default")]
    pub input: IndexMap<String, Value>,
}

impl ToolUse {
    /// Get a string-valued input parameter.
    #[must_use]
    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.input.get(key).and_then(Value::as_str)
    }

    /// Check if this is an MCP tool.
    #[must_use]
    pub fn is_mcp_tool(&self) -> bool {
        self.name.starts_with("mcp__")
    }
}

/// Tool result content block - tool execution outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Links to corresponding tool_use.id.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tool_use_id: String,

    /// Result content, flattened to a string.
    #[serde(default, deserialize_with = "flatten_result_content")]
    pub content: String,

    /// Explicit status, when the producer records one.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub status: String,

    /// Explicit error text, when the producer records one.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub error: String,

    /// Error flag set by Claude Code on failed tool executions.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    /// Status after taking the `is_error` flag into account.
    #[must_use]
    pub fn effective_status(&self) -> &str {
        if !self.status.is_empty() {
            &self.status
        } else if self.is_error {
            "error"
        } else {
            ""
        }
    }

    /// Error text after taking the `is_error` flag into account.
    #[must_use]
    pub fn effective_error(&self) -> &str {
        if !self.error.is_empty() {
            &self.error
        } else if self.is_error {
            &self.content
        } else {
            ""
        }
    }

    /// Whether the execution failed by any of the recorded signals.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.is_error || self.status == "error" || !self.error.is_empty()
    }
}

/// Accepts a string, an array of `{type, text}` parts, or null.
fn flatten_result_content<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Array(parts) => {
            let texts: Vec<&str> = parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .filter(|text| !text.is_empty())
                .collect();
            Ok(texts.join("\n"))
        }
        other => Err(D::Error::custom(format!(
            "tool_result content must be a string or an array, got {other}"
        ))),
    }
}
