//! Stats command implementation.

use super::CommandContext;
use crate::analytics::{aggregate_tool_calls, analyze_file_stats, analyze_time_series, sort_file_stats, SessionStats};
use crate::cli::StatsCommand;
use crate::error::Result;
use crate::model::extract_tool_calls;
use crate::query::{filter_records, parse_expression};

/// Run a stats subcommand.
pub fn run(ctx: &CommandContext, command: &StatsCommand) -> Result<()> {
    match command {
        StatsCommand::Session(args) => {
            let entries = ctx.load(&args.session)?;
            let calls = extract_tool_calls(&entries);
            ctx.emit(&SessionStats::calculate(&entries, &calls))
        }
        StatsCommand::Files(args) => {
            let entries = ctx.load(&args.session)?;
            let mut stats = analyze_file_stats(&extract_tool_calls(&entries));
            if let Some(key) = args.sort_by {
                sort_file_stats(&mut stats, key);
            }
            ctx.emit(&stats)
        }
        StatsCommand::Timeseries(args) => {
            let entries = ctx.load(&args.session)?;
            let points = analyze_time_series(
                &extract_tool_calls(&entries),
                args.metric.unwrap_or_default(),
                args.interval.unwrap_or_default(),
            )?;
            ctx.emit(&points)
        }
        StatsCommand::Aggregate(args) => {
            let filter = args.filter.as_deref().map(parse_expression).transpose()?;
            let entries = ctx.load_window(&args.session, &args.time.to_filter())?;
            let mut calls = extract_tool_calls(&entries);
            if let Some(expression) = &filter {
                calls = filter_records(calls, expression)?;
            }
            ctx.emit(&aggregate_tool_calls(&calls, args.group_by.unwrap_or_default(), &args.metrics)?)
        }
    }
}
