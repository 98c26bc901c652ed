//! Idle periods: long gaps between consecutive turns.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::model::{ContentBlock, SessionEntry};
use crate::turns::TurnIndex;
use crate::util::{truncate_chars, unix_seconds};

/// Characters of text kept in a [`TurnContext`] preview.
const PREVIEW_CHARS: usize = 100;

/// A gap between two consecutive turns that met the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdlePeriod {
    /// Turn before the gap.
    pub start_turn: usize,
    /// Turn after the gap.
    pub end_turn: usize,
    /// Gap length in minutes.
    #[serde(rename = "duration_minutes")]
    pub duration_min: f64,
    /// Unix time of the turn before the gap.
    pub start_timestamp: i64,
    /// Unix time of the turn after the gap.
    pub end_timestamp: i64,
    /// What happened just before the gap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_before: Option<TurnContext>,
    /// What happened just after the gap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_after: Option<TurnContext>,
}

/// Summary of one turn around an idle period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnContext {
    /// Turn number.
    pub turn: usize,
    /// Entry type ("user" or "assistant").
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    /// First tool invoked in the turn.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tool: String,
    /// Status of the first tool result in the turn.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    /// First non-empty text, cut to 100 characters.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub preview: String,
}

impl TurnContext {
    /// Summarize an entry at the given turn.
    #[must_use]
    pub fn from_entry(entry: &SessionEntry, turn: usize) -> Self {
        let mut context = Self {
            turn,
            role: entry.entry_type.clone(),
            ..Self::default()
        };

        for block in entry.content() {
            match block {
                ContentBlock::ToolUse(tool_use) if context.tool.is_empty() => {
                    context.tool = tool_use.name.clone();
                }
                ContentBlock::ToolResult(result) if context.status.is_empty() => {
                    context.status = result.effective_status().to_string();
                }
                ContentBlock::Text(text) if context.preview.is_empty() && !text.text.is_empty() => {
                    context.preview = truncate_chars(&text.text, PREVIEW_CHARS);
                }
                _ => {}
            }
        }
        context
    }
}

/// Gaps of at least `threshold_minutes` between consecutive message turns.
///
/// Pairs where either timestamp is unparsable are skipped.
#[instrument(skip(entries), fields(entries = entries.len()))]
pub fn detect_idle_periods(entries: &[SessionEntry], threshold_minutes: u64) -> Vec<IdlePeriod> {
    let turn_index = TurnIndex::build(entries);

    let mut turns: Vec<(usize, &SessionEntry)> = entries
        .iter()
        .filter_map(|entry| turn_index.get(&entry.uuid).map(|turn| (turn, entry)))
        .collect();
    turns.sort_by_key(|(turn, _)| *turn);

    let threshold_secs = threshold_minutes.saturating_mul(60) as i64;
    let periods: Vec<IdlePeriod> = turns
        .windows(2)
        .filter_map(|pair| {
            let (start_turn, before) = pair[0];
            let (end_turn, after) = pair[1];
            let start = unix_seconds(&before.timestamp)?;
            let end = unix_seconds(&after.timestamp)?;
            let gap = end - start;
            (gap >= threshold_secs).then(|| IdlePeriod {
                start_turn,
                end_turn,
                duration_min: gap as f64 / 60.0,
                start_timestamp: start,
                end_timestamp: end,
                context_before: Some(TurnContext::from_entry(before, start_turn)),
                context_after: Some(TurnContext::from_entry(after, end_turn)),
            })
        })
        .collect();

    debug!(periods = periods.len(), threshold_minutes, "Detected idle periods");
    periods
}
