//! Analytics over a parsed session.
//!
//! This module provides:
//! - Session statistics (counts, duration, error rate, top tools)
//! - Tool-call metrics grouped by tool, status or entry
//! - Error signatures and repeated-error detection
//! - Repeated tool-sequence mining
//! - File churn and per-file statistics
//! - Idle periods between turns
//! - Time series of tool-call metrics

pub mod aggregate;
pub mod churn;
pub mod errors;
pub mod files;
pub mod idle;
pub mod sequences;
pub mod signature;
pub mod timeseries;

use chrono::Duration;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub use aggregate::{aggregate_tool_calls, AggregateMetric, GroupBy, GroupStats};
pub use churn::{detect_file_churn, FileChurnDetail};
pub use errors::{detect_error_patterns, ErrorPattern, PatternContext, MIN_PATTERN_OCCURRENCES};
pub use files::{analyze_file_stats, sort_file_stats, FileStats, FileStatsSort};
pub use idle::{detect_idle_periods, IdlePeriod, TurnContext};
pub use sequences::{
    detect_tool_sequences, parse_sequence_pattern, SequenceOccurrence, SequencePattern, ToolInSequence,
    SEQUENCE_SEPARATOR,
};
pub use signature::calculate_error_signature;
pub use timeseries::{analyze_time_series, Interval, Metric, TimeSeriesPoint};

use crate::model::{SessionEntry, ToolCall};
use crate::util::parse_timestamp;

/// Number of tools listed in [`SessionStats::top_tools`].
pub const TOP_TOOLS: usize = 5;

/// Summary statistics for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// All entries, messages or not.
    pub turn_count: usize,
    /// Entries of type `user`.
    pub user_turn_count: usize,
    /// Entries of type `assistant`.
    pub assistant_turn_count: usize,
    /// Tool calls.
    pub tool_call_count: usize,
    /// Tool calls with status `error` or error text.
    pub error_count: usize,
    /// Seconds between the first and last entry.
    pub duration_seconds: i64,
    /// Calls per tool, in first-use order.
    pub tool_frequency: IndexMap<String, usize>,
    /// Failed calls as a percentage of all calls.
    pub error_rate: f64,
    /// Most used tools, most frequent first.
    pub top_tools: Vec<ToolFrequency>,
}

/// Call count for one tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFrequency {
    /// Tool name.
    pub name: String,
    /// Number of calls.
    pub count: usize,
}

impl SessionStats {
    /// Compute statistics from a session and its tool calls.
    #[instrument(skip_all, fields(entries = entries.len(), tool_calls = tool_calls.len()))]
    pub fn calculate(entries: &[SessionEntry], tool_calls: &[ToolCall]) -> Self {
        let mut stats = Self {
            turn_count: entries.len(),
            user_turn_count: entries.iter().filter(|e| e.is_user()).count(),
            assistant_turn_count: entries.iter().filter(|e| e.is_assistant()).count(),
            tool_call_count: tool_calls.len(),
            ..Self::default()
        };

        for call in tool_calls {
            if call.is_error() {
                stats.error_count += 1;
            }
            *stats.tool_frequency.entry(call.tool_name.clone()).or_insert(0) += 1;
        }

        if stats.tool_call_count > 0 {
            stats.error_rate = stats.error_count as f64 / stats.tool_call_count as f64 * 100.0;
        }

        if let (Some(first), Some(last)) = (entries.first(), entries.last()) {
            if let (Some(start), Some(end)) = (parse_timestamp(&first.timestamp), parse_timestamp(&last.timestamp)) {
                stats.duration_seconds = (end - start).num_seconds();
            }
        }

        stats.top_tools = top_tools(&stats.tool_frequency, TOP_TOOLS);
        debug!(
            tool_calls = stats.tool_call_count,
            errors = stats.error_count,
            "Calculated session statistics"
        );
        stats
    }

    /// Session duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::seconds(self.duration_seconds)
    }

    /// Get duration as human-readable string.
    #[must_use]
    pub fn duration_string(&self) -> String {
        let total_secs = self.duration().num_seconds();
        if total_secs < 60 {
            format!("{total_secs}s")
        } else if total_secs < 3600 {
            format!("{}m {}s", total_secs / 60, total_secs % 60)
        } else {
            format!(
                "{}h {}m {}s",
                total_secs / 3600,
                (total_secs % 3600) / 60,
                total_secs % 60
            )
        }
    }
}

/// The `n` most called tools; equal counts are ordered by name.
fn top_tools(frequency: &IndexMap<String, usize>, n: usize) -> Vec<ToolFrequency> {
    let mut tools: Vec<ToolFrequency> = frequency
        .iter()
        .map(|(name, count)| ToolFrequency {
            name: name.clone(),
            count: *count,
        })
        .collect();
    tools.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    tools.truncate(n);
    tools
}
