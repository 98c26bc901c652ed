//! Message view commands.

use super::CommandContext;
use crate::cli::{MessagesCommand, PageArgs};
use crate::error::Result;
use crate::query::{
    build_assistant_messages, build_conversation_turns, build_user_messages, AssistantMessagesOptions,
    ConversationOptions, UserMessagesOptions,
};

/// Run a messages subcommand.
pub fn run(ctx: &CommandContext, command: &MessagesCommand) -> Result<()> {
    match command {
        MessagesCommand::User(args) => {
            let opts = UserMessagesOptions {
                pattern: args.page.pattern.clone(),
                context: args.context,
                limit: page_limit(ctx, &args.page),
                offset: args.page.offset,
                sort_by: args.sort_by.unwrap_or_default(),
                reverse: args.page.reverse,
            };
            let entries = ctx.load(&args.session)?;
            ctx.emit(&build_user_messages(&entries, &opts)?)
        }
        MessagesCommand::Assistant(args) => {
            let opts = AssistantMessagesOptions {
                pattern: args.page.pattern.clone(),
                min_tools: args.min_tools,
                max_tools: args.max_tools,
                min_tokens_output: args.min_tokens_output,
                min_length: args.min_length,
                max_length: args.max_length,
                limit: page_limit(ctx, &args.page),
                offset: args.page.offset,
                sort_by: args.sort_by.unwrap_or_default(),
                reverse: args.page.reverse,
            };
            let entries = ctx.load(&args.session)?;
            ctx.emit(&build_assistant_messages(&entries, &opts)?)
        }
        MessagesCommand::Conversation(args) => {
            let opts = ConversationOptions {
                start_turn: args.start_turn,
                end_turn: args.end_turn,
                pattern: args.page.pattern.clone(),
                pattern_target: args.pattern_target.unwrap_or_default(),
                min_duration_ms: args.min_duration_ms,
                max_duration_ms: args.max_duration_ms,
                limit: page_limit(ctx, &args.page),
                offset: args.page.offset,
                sort_by: args.sort_by.unwrap_or_default(),
                reverse: args.page.reverse,
            };
            let entries = ctx.load(&args.session)?;
            ctx.emit(&build_conversation_turns(&entries, &opts)?)
        }
    }
}

fn page_limit(ctx: &CommandContext, page: &PageArgs) -> usize {
    ctx.limit(page.limit)
}
