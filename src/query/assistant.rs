//! Assistant responses with token and tool-use metrics.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::messages::compile_pattern;
use super::sort_directed;
use crate::error::{Result, ValidationError};
use crate::model::{ContentBlock, SessionEntry};
use crate::turns::TurnIndex;
use crate::util::paginate;

/// Sort key for assistant messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssistantMessageSort {
    /// Turn number.
    #[default]
    Turn,
    /// Timestamp string.
    Timestamp,
    /// Number of tool uses.
    ToolUseCount,
    /// Text length in characters.
    TextLength,
}

impl FromStr for AssistantMessageSort {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "turn" | "turn_sequence" => Ok(Self::Turn),
            "timestamp" => Ok(Self::Timestamp),
            "tool_use_count" => Ok(Self::ToolUseCount),
            "text_length" => Ok(Self::TextLength),
            _ => Err(ValidationError::new(
                "sort_by",
                s,
                &["turn", "timestamp", "tool_use_count", "text_length"],
            )),
        }
    }
}

/// Options for [`build_assistant_messages`]. `None` bounds are unchecked.
#[derive(Debug, Clone, Default)]
pub struct AssistantMessagesOptions {
    /// Regex matched against the text.
    pub pattern: Option<String>,
    /// Minimum tool uses.
    pub min_tools: Option<usize>,
    /// Maximum tool uses.
    pub max_tools: Option<usize>,
    /// Minimum output tokens.
    pub min_tokens_output: Option<u64>,
    /// Minimum text length.
    pub min_length: Option<usize>,
    /// Maximum text length.
    pub max_length: Option<usize>,
    /// Maximum results (0 = no limit).
    pub limit: usize,
    /// Results skipped before the limit applies.
    pub offset: usize,
    /// Sort key.
    pub sort_by: AssistantMessageSort,
    /// Sort descending.
    pub reverse: bool,
}

/// Summary of one content block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    /// Block type tag.
    #[serde(rename = "type")]
    pub block_type: String,
    /// Text, for text blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Tool name, for tool_use blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl From<&ContentBlock> for BlockSummary {
    fn from(block: &ContentBlock) -> Self {
        Self {
            block_type: block.type_name().to_string(),
            text: block.as_text().map(str::to_string),
            tool_name: block.as_tool_use().map(|t| t.name.clone()),
        }
    }
}

/// One assistant response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// Turn number.
    pub turn_sequence: usize,
    /// Entry UUID.
    pub uuid: String,
    /// Entry timestamp.
    pub timestamp: String,
    /// Model that produced the response.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model: String,
    /// Block summaries in order.
    pub content_blocks: Vec<BlockSummary>,
    /// Characters across all text blocks.
    pub text_length: usize,
    /// Number of tool_use blocks.
    pub tool_use_count: usize,
    /// Input tokens reported in usage.
    pub tokens_input: u64,
    /// Output tokens reported in usage.
    pub tokens_output: u64,
    /// Why generation stopped.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stop_reason: String,
}

impl AssistantMessage {
    /// Project an assistant entry; `None` for anything else.
    #[must_use]
    pub fn from_entry(entry: &SessionEntry, turn_sequence: usize) -> Option<Self> {
        let message = entry.message.as_ref().filter(|_| entry.is_assistant())?;
        Some(Self {
            turn_sequence,
            uuid: entry.uuid.clone(),
            timestamp: entry.timestamp.clone(),
            model: message.model.clone(),
            content_blocks: message.content.iter().map(BlockSummary::from).collect(),
            text_length: message.texts().map(|t| t.chars().count()).sum(),
            tool_use_count: message.tool_uses().count(),
            tokens_input: message.usage_count("input_tokens"),
            tokens_output: message.usage_count("output_tokens"),
            stop_reason: message.stop_reason.clone(),
        })
    }

    fn texts(&self) -> impl Iterator<Item = &str> {
        self.content_blocks.iter().filter_map(|b| b.text.as_deref())
    }
}

fn within(value: usize, min: Option<usize>, max: Option<usize>) -> bool {
    min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
}

/// Assistant responses matching the options, sorted and paginated.
#[instrument(skip(entries), fields(entries = entries.len()))]
pub fn build_assistant_messages(
    entries: &[SessionEntry],
    opts: &AssistantMessagesOptions,
) -> Result<Vec<AssistantMessage>> {
    let pattern = compile_pattern(opts.pattern.as_deref())?;
    let turn_index = TurnIndex::build(entries);

    let mut messages: Vec<AssistantMessage> = entries
        .iter()
        .filter_map(|e| AssistantMessage::from_entry(e, turn_index.get(&e.uuid).unwrap_or_default()))
        .filter(|m| {
            pattern.as_ref().map_or(true, |re| {
                re.is_match(&m.texts().collect::<String>()) || m.texts().any(|t| re.is_match(t))
            })
        })
        .filter(|m| within(m.tool_use_count, opts.min_tools, opts.max_tools))
        .filter(|m| opts.min_tokens_output.map_or(true, |min| m.tokens_output >= min))
        .filter(|m| within(m.text_length, opts.min_length, opts.max_length))
        .collect();

    sort_directed(&mut messages, opts.reverse, |a, b| match opts.sort_by {
        AssistantMessageSort::Turn => a.turn_sequence.cmp(&b.turn_sequence),
        AssistantMessageSort::Timestamp => a.timestamp.cmp(&b.timestamp),
        AssistantMessageSort::ToolUseCount => a.tool_use_count.cmp(&b.tool_use_count),
        AssistantMessageSort::TextLength => a.text_length.cmp(&b.text_length),
    });

    let messages = paginate(messages, opts.offset, opts.limit);
    debug!(messages = messages.len(), "Built assistant messages");
    Ok(messages)
}
