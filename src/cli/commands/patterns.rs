//! Workflow pattern commands: errors, sequences, churn and idle periods.

use super::CommandContext;
use crate::analytics::{detect_error_patterns, detect_file_churn, detect_idle_periods, detect_tool_sequences};
use crate::cli::{ChurnArgs, IdleArgs, SequencesArgs, SessionArg};
use crate::error::Result;
use crate::model::extract_tool_calls;
use crate::query::{build_tool_sequence_query, ToolSequenceQuery};

/// Run the errors command.
pub fn run_errors(ctx: &CommandContext, args: &SessionArg) -> Result<()> {
    let entries = ctx.load(&args.session)?;
    let calls = extract_tool_calls(&entries);
    ctx.emit(&detect_error_patterns(&entries, &calls))
}

/// Run the sequences command.
///
/// A named pattern or `--no-builtin` goes through the sequence query;
/// otherwise every sequence of at least `min_length` calls is mined.
pub fn run_sequences(ctx: &CommandContext, args: &SequencesArgs) -> Result<()> {
    let settings = &ctx.config.sequences;
    let min_occurrences = args.min_occurrences.unwrap_or(settings.min_occurrences);
    let include_builtin = settings.include_builtin && !args.no_builtin;

    let entries = ctx.load_window(&args.session, &args.time.to_filter())?;
    let result = if args.pattern.is_some() || !include_builtin {
        build_tool_sequence_query(&entries, min_occurrences, args.pattern.as_deref(), include_builtin)?
    } else {
        let min_length = args.min_length.unwrap_or(settings.min_length);
        ToolSequenceQuery {
            sequences: detect_tool_sequences(&entries, min_length, min_occurrences)?,
        }
    };
    ctx.emit(&result)
}

/// Run the churn command.
pub fn run_churn(ctx: &CommandContext, args: &ChurnArgs) -> Result<()> {
    let threshold = args.threshold.unwrap_or(ctx.config.churn.threshold);
    let entries = ctx.load(&args.session)?;
    ctx.emit(&detect_file_churn(&entries, threshold))
}

/// Run the idle command.
pub fn run_idle(ctx: &CommandContext, args: &IdleArgs) -> Result<()> {
    let threshold = args.threshold_minutes.unwrap_or(ctx.config.idle.threshold_minutes);
    let entries = ctx.load(&args.session)?;
    ctx.emit(&detect_idle_periods(&entries, threshold))
}
