//! Query command implementation.

use chrono::{DateTime, Utc};
use tracing::warn;

use super::CommandContext;
use crate::cli::QueryArgs;
use crate::error::{MetaError, Result};
use crate::query::{query, resolve_since, QueryParams, QueryResult, TimeFilter, TimeRange};

/// Run the query command.
pub fn run(ctx: &CommandContext, args: &QueryArgs) -> Result<()> {
    let now = Utc::now();
    let params = build_params(args, now)?;
    if !params.jq_filter.is_empty() {
        warn!(jq_filter = %params.jq_filter, "jq filters are not applied");
    }
    let limit = if params.output.limit > 0 {
        params.output.limit
    } else {
        ctx.limit(args.limit)
    };

    let window = TimeFilter {
        last_n_turns: args.last_n_turns,
        ..TimeFilter::default()
    };
    let entries = window.apply(ctx.load(&args.session)?, now)?;
    let result = limit_result(query(&entries, params)?, limit);
    ctx.emit(&result)
}

/// Query parameters from `--params` with individual flags laid over them.
///
/// A relative `--since` is resolved against `now`.
pub(crate) fn build_params(args: &QueryArgs, now: DateTime<Utc>) -> Result<QueryParams> {
    let mut params: QueryParams = match &args.params {
        Some(json) => serde_json::from_str(json)
            .map_err(|e| MetaError::invalid_argument("params", format!("not a valid query document: {e}")))?,
        None => QueryParams::default(),
    };

    let overlay = |target: &mut String, value: &Option<String>| {
        if let Some(value) = value {
            target.clone_from(value);
        }
    };
    overlay(&mut params.resource, &args.resource);
    overlay(&mut params.filter.entry_type, &args.entry_type);
    overlay(&mut params.filter.role, &args.role);
    overlay(&mut params.filter.session_id, &args.session_id);
    overlay(&mut params.filter.uuid, &args.uuid);
    overlay(&mut params.filter.parent_uuid, &args.parent_uuid);
    overlay(&mut params.filter.git_branch, &args.git_branch);
    overlay(&mut params.filter.content_type, &args.content_type);
    overlay(&mut params.filter.content_match, &args.content_match);
    overlay(&mut params.filter.tool_name, &args.tool_name);
    overlay(&mut params.filter.tool_status, &args.tool_status);
    overlay(&mut params.aggregate.function, &args.aggregate);
    overlay(&mut params.aggregate.field, &args.field);

    if args.has_error.is_some() {
        params.filter.has_error = args.has_error;
    }
    if args.since.is_some() || args.until.is_some() {
        let range = params.filter.time_range.get_or_insert_with(TimeRange::default);
        let since = args.since.as_deref().map(|s| resolve_since(s, now)).transpose()?;
        overlay(&mut range.start, &since);
        overlay(&mut range.end, &args.until);
    }
    if let Some(limit) = args.limit {
        params.output.limit = limit;
    }

    Ok(params)
}

/// Keep at most `limit` top-level items (0 = no limit).
fn limit_result(result: QueryResult, limit: usize) -> QueryResult {
    match result {
        QueryResult::Resources(resources) => QueryResult::Resources(resources.truncate(limit)),
        QueryResult::Rows(mut rows) => {
            if limit > 0 {
                rows.truncate(limit);
            }
            QueryResult::Rows(rows)
        }
    }
}
