//! Tools command implementation.

use super::CommandContext;
use crate::cli::ToolsArgs;
use crate::error::Result;
use crate::query::{parse_expression, run_tools_query, ToolsQueryOptions};

/// Run the tools command.
pub fn run(ctx: &CommandContext, args: &ToolsArgs) -> Result<()> {
    let opts = ToolsQueryOptions {
        filter: args.where_clause.as_deref().map(parse_expression).transpose()?,
        status: args.status,
        tool: args.tool.clone(),
        sort_by: args.sort_by.unwrap_or_default(),
        reverse: args.reverse,
        offset: args.offset,
        limit: ctx.limit(args.limit),
    };
    let entries = ctx.load_window(&args.session, &args.time.to_filter())?;
    ctx.emit(&run_tools_query(&entries, &opts)?)
}
