//! Session state commands: prompts, project state, file access and error context.

use super::CommandContext;
use crate::cli::{ContextArgs, FileAccessArgs, ProjectStateArgs, PromptsArgs};
use crate::error::Result;
use crate::query::{
    build_context_query, build_file_access_query, build_project_state, build_successful_prompts,
    ProjectStateOptions,
};

/// Run the prompts command.
pub fn run_prompts(ctx: &CommandContext, args: &PromptsArgs) -> Result<()> {
    let min_quality = args.min_quality.unwrap_or(ctx.config.prompts.min_quality);
    let limit = args.limit.unwrap_or(ctx.config.prompts.limit);
    let entries = ctx.load(&args.session)?;
    ctx.emit(&build_successful_prompts(&entries, min_quality, limit))
}

/// Run the project-state command.
pub fn run_project_state(ctx: &CommandContext, args: &ProjectStateArgs) -> Result<()> {
    let entries = ctx.load(&args.session)?;
    let opts = ProjectStateOptions {
        include_incomplete: args.include_incomplete,
    };
    ctx.emit(&build_project_state(&entries, opts))
}

/// Run the file-access command.
pub fn run_file_access(ctx: &CommandContext, args: &FileAccessArgs) -> Result<()> {
    let entries = ctx.load_window(&args.session, &args.time.to_filter())?;
    ctx.emit(&build_file_access_query(&entries, &args.file)?)
}

/// Run the context command.
pub fn run_context(ctx: &CommandContext, args: &ContextArgs) -> Result<()> {
    let window = args
        .window
        .unwrap_or_else(|| i64::try_from(ctx.config.context.window).unwrap_or(i64::MAX));
    let entries = ctx.load(&args.session)?;
    ctx.emit(&build_context_query(&entries, &args.signature, window)?)
}
