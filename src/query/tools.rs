//! Tool-call listing with status, name and expression filters.

use std::str::FromStr;

use tracing::{debug, instrument};

use super::expression::{filter_records, Expression};
use super::sort_directed;
use crate::error::{Result, ValidationError};
use crate::model::{extract_tool_calls, SessionEntry, ToolCall};
use crate::util::paginate;

/// Outcome filter for tool calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatusFilter {
    /// Status "error" or a recorded error text.
    Error,
    /// Neither.
    Success,
}

impl FromStr for ToolStatusFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "error" => Ok(Self::Error),
            "success" => Ok(Self::Success),
            _ => Err(ValidationError::new("status", s, &["error", "success"])),
        }
    }
}

/// Sort key for tool calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolSort {
    /// Timestamp of the issuing entry.
    #[default]
    Timestamp,
    /// Tool name.
    Tool,
    /// Result status.
    Status,
    /// Issuing entry UUID.
    Uuid,
}

impl FromStr for ToolSort {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "timestamp" => Ok(Self::Timestamp),
            "tool" => Ok(Self::Tool),
            "status" => Ok(Self::Status),
            "uuid" => Ok(Self::Uuid),
            _ => Err(ValidationError::new("sort_by", s, &["timestamp", "tool", "status", "uuid"])),
        }
    }
}

/// Options for [`run_tools_query`].
#[derive(Debug, Clone, Default)]
pub struct ToolsQueryOptions {
    /// Filter expression, applied before the other filters.
    pub filter: Option<Expression>,
    /// Keep only failed or only successful calls.
    pub status: Option<ToolStatusFilter>,
    /// Exact tool name.
    pub tool: Option<String>,
    /// Sort key.
    pub sort_by: ToolSort,
    /// Sort descending.
    pub reverse: bool,
    /// Calls skipped before the limit applies.
    pub offset: usize,
    /// Maximum calls returned (0 = no limit).
    pub limit: usize,
}

impl ToolsQueryOptions {
    fn matches(&self, call: &ToolCall) -> bool {
        let status = match self.status {
            Some(ToolStatusFilter::Error) => call.is_error(),
            Some(ToolStatusFilter::Success) => !call.is_error(),
            None => true,
        };
        status && self.tool.as_ref().map_or(true, |t| call.tool_name == *t)
    }
}

/// Tool calls of the session, filtered, sorted and paginated.
#[instrument(skip(entries), fields(entries = entries.len()))]
pub fn run_tools_query(entries: &[SessionEntry], opts: &ToolsQueryOptions) -> Result<Vec<ToolCall>> {
    let mut calls = extract_tool_calls(entries);
    if let Some(expression) = &opts.filter {
        calls = filter_records(calls, expression)?;
    }
    calls.retain(|call| opts.matches(call));

    sort_directed(&mut calls, opts.reverse, |a, b| match opts.sort_by {
        ToolSort::Timestamp => a.timestamp.cmp(&b.timestamp),
        ToolSort::Tool => a.tool_name.cmp(&b.tool_name),
        ToolSort::Status => a.status.cmp(&b.status),
        ToolSort::Uuid => a.uuid.cmp(&b.uuid),
    });

    let calls = paginate(calls, opts.offset, opts.limit);
    debug!(calls = calls.len(), "Ran tools query");
    Ok(calls)
}
