//! Queries over a parsed session.
//!
//! This module provides:
//! - The unified query pipeline (select, filter, transform, aggregate)
//! - Tool-call listing with SQL-like filter expressions
//! - Relative time windows (`5 minutes ago`, last N turns)
//! - User, assistant and conversation-turn views
//! - Prompt scoring and project state
//! - File access history and error context windows
//! - Tool-sequence search

pub mod aggregate;
pub mod assistant;
pub mod context;
pub mod conversation;
pub mod expression;
pub mod file_access;
pub mod filter;
pub mod messages;
pub mod params;
pub mod project_state;
pub mod prompts;
pub mod resources;
pub mod sequences;
pub mod time;
pub mod tools;
pub mod unified;

use std::cmp::Ordering;

pub use aggregate::{apply_aggregate, AggregateRow, QueryResult};
pub use assistant::{build_assistant_messages, AssistantMessage, AssistantMessageSort, AssistantMessagesOptions};
pub use context::{build_context_query, ContextOccurrence, ContextQuery, ErrorDetail, TurnPreview};
pub use conversation::{
    build_conversation_turns, ConversationOptions, ConversationSort, ConversationTurn, PatternTarget,
};
pub use expression::{filter_records, parse_expression, Expression, ExpressionError, FieldValue, Record};
pub use file_access::{build_file_access_query, FileAccessEvent, FileAccessQuery};
pub use filter::{apply_filter, filter_items, matches_pattern};
pub use messages::{
    build_user_messages, is_system_message, ContextEntry, UserMessage, UserMessageSort, UserMessagesOptions,
};
pub use params::{
    apply_defaults, validate_query_params, AggregateSpec, FilterSpec, JoinSpec, OutputSpec, QueryParams,
    TimeRange, TransformSpec,
};
pub use project_state::{build_project_state, FileActivity, IncompleteTask, ProjectState, ProjectStateOptions};
pub use prompts::{build_successful_prompts, SuccessfulPrompt, SuccessfulPromptsResult};
pub use resources::{extract_messages, select_resource, MessageView, QueryResource, Resources};
pub use sequences::{build_tool_sequence_query, ToolSequenceQuery};
pub use time::{parse_relative_duration, resolve_since, TimeFilter};
pub use tools::{run_tools_query, ToolSort, ToolStatusFilter, ToolsQueryOptions};
pub use unified::query;

/// Stable sort by `cmp`, descending when `reverse` is set. Equal items keep
/// their order either way.
pub(crate) fn sort_directed<T>(items: &mut [T], reverse: bool, cmp: impl Fn(&T, &T) -> Ordering) {
    if reverse {
        items.sort_by(|a, b| cmp(b, a));
    } else {
        items.sort_by(cmp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sort_directed_is_stable() {
        let mut items = vec![(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd')];
        sort_directed(&mut items, false, |x, y| x.0.cmp(&y.0));
        assert_eq!(items, vec![(1, 'b'), (1, 'd'), (2, 'a'), (2, 'c')]);

        sort_directed(&mut items, true, |x, y| x.0.cmp(&y.0));
        assert_eq!(items, vec![(2, 'a'), (2, 'c'), (1, 'b'), (1, 'd')]);
    }
}
