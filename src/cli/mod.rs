//! Command-line interface for claude-meta.
//!
//! Every subcommand loads one session transcript and prints its result as
//! JSON on stdout:
//! - `query`: unified select/filter/aggregate pipeline
//! - `errors`, `sequences`, `churn`, `idle`: workflow patterns
//! - `stats`: session, per-file, time-series and grouped tool-call statistics
//! - `messages`: user, assistant and conversation-turn views
//! - `prompts`, `project-state`, `file-access`, `context`, `tools`
//!
//! `tools`, `sequences`, `file-access` and `stats aggregate` also take a time
//! window (`--since "30 minutes ago"`, `--last-n-turns`, `--from`, `--to`).

mod commands;

pub use commands::CommandContext;

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;

use crate::analytics::{AggregateMetric, FileStatsSort, GroupBy, Interval, Metric};
use crate::config::Config;
use crate::error::{MetaError, Result};
use crate::query::{
    AssistantMessageSort, ConversationSort, PatternTarget, TimeFilter, ToolSort, ToolStatusFilter,
    UserMessageSort,
};

/// Query engine and workflow pattern mining for Claude Code session transcripts.
#[derive(Debug, Parser)]
#[command(name = "cmeta")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Pretty-print JSON output.
    #[arg(long, global = true, env = "CMETA_PRETTY")]
    pub pretty: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn", env = "CMETA_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Log format (text, json, compact, pretty).
    #[arg(long, global = true, default_value = "text", env = "CMETA_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Path to a configuration file (skips global and project lookup).
    #[arg(long, global = true, env = "CMETA_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Log level options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings.
    #[default]
    Warn,
    /// Errors, warnings, and informational messages.
    Info,
    /// All of the above plus debug messages.
    Debug,
    /// All messages including trace-level details.
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter level.
    #[must_use]
    pub fn to_filter_string(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format.
    #[default]
    Text,
    /// Structured JSON format for machine consumption.
    Json,
    /// Compact single-line format.
    Compact,
    /// Pretty format with full details.
    Pretty,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a unified query (select, filter, aggregate).
    #[command(alias = "q")]
    Query(QueryArgs),

    /// Detect errors repeated at least three times.
    Errors(SessionArg),

    /// Mine repeated tool-call sequences.
    #[command(alias = "seq")]
    Sequences(SequencesArgs),

    /// Find files accessed repeatedly.
    Churn(ChurnArgs),

    /// Find long gaps between turns.
    Idle(IdleArgs),

    /// Session, per-file and time-series statistics.
    #[command(subcommand)]
    Stats(StatsCommand),

    /// User, assistant and conversation-turn views.
    #[command(subcommand)]
    Messages(MessagesCommand),

    /// Score user prompts by their outcome.
    Prompts(PromptsArgs),

    /// Summarize where the session stands.
    ProjectState(ProjectStateArgs),

    /// Access history of one file.
    FileAccess(FileAccessArgs),

    /// Turns surrounding each occurrence of an error signature.
    Context(ContextArgs),

    /// List tool calls with their results.
    Tools(ToolsArgs),
}

/// A single session transcript.
#[derive(Debug, Args)]
pub struct SessionArg {
    /// Session JSONL file.
    pub session: PathBuf,
}

/// Time window applied to a session before a command analyzes it.
#[derive(Debug, Clone, Default, Args)]
pub struct TimeWindowArgs {
    /// Keep entries newer than a relative time, e.g. "30 minutes ago".
    #[arg(long)]
    pub since: Option<String>,

    /// Keep only the last N turns; overrides the other bounds.
    #[arg(long, default_value_t = 0)]
    pub last_n_turns: usize,

    /// Earliest Unix timestamp, in seconds.
    #[arg(long)]
    pub from: Option<i64>,

    /// Latest Unix timestamp, in seconds.
    #[arg(long)]
    pub to: Option<i64>,
}

impl TimeWindowArgs {
    /// The window as a [`TimeFilter`].
    #[must_use]
    pub fn to_filter(&self) -> TimeFilter {
        TimeFilter {
            since: self.since.clone(),
            last_n_turns: self.last_n_turns,
            from_ts: self.from,
            to_ts: self.to,
        }
    }
}

/// Arguments for the query command.
#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Session JSONL file.
    pub session: PathBuf,

    /// Full query parameters as a JSON document; flags override its fields.
    #[arg(long)]
    pub params: Option<String>,

    /// Resource to select (entries, messages, tools).
    #[arg(short = 'r', long)]
    pub resource: Option<String>,

    /// Entry type.
    #[arg(long = "type")]
    pub entry_type: Option<String>,

    /// Message role.
    #[arg(long)]
    pub role: Option<String>,

    /// Session ID.
    #[arg(long)]
    pub session_id: Option<String>,

    /// Entry UUID.
    #[arg(long)]
    pub uuid: Option<String>,

    /// Parent UUID.
    #[arg(long)]
    pub parent_uuid: Option<String>,

    /// Git branch.
    #[arg(long)]
    pub git_branch: Option<String>,

    /// Content block type present in the message.
    #[arg(long)]
    pub content_type: Option<String>,

    /// Regular expression matched against message text.
    #[arg(long)]
    pub content_match: Option<String>,

    /// Tool name.
    #[arg(long)]
    pub tool_name: Option<String>,

    /// Tool status.
    #[arg(long)]
    pub tool_status: Option<String>,

    /// Keep only tool calls with (true) or without (false) an error.
    #[arg(long)]
    pub has_error: Option<bool>,

    /// Earliest timestamp (ISO 8601 or "N minutes ago", inclusive).
    #[arg(long)]
    pub since: Option<String>,

    /// Latest timestamp (ISO 8601, inclusive).
    #[arg(long)]
    pub until: Option<String>,

    /// Query only the last N turns.
    #[arg(long, default_value_t = 0)]
    pub last_n_turns: usize,

    /// Aggregate function (count, group).
    #[arg(short = 'a', long)]
    pub aggregate: Option<String>,

    /// Field to aggregate by.
    #[arg(short = 'f', long)]
    pub field: Option<String>,

    /// Maximum number of results.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

/// Arguments for the sequences command.
#[derive(Debug, Args)]
pub struct SequencesArgs {
    /// Session JSONL file.
    pub session: PathBuf,

    /// Shortest sequence mined.
    #[arg(long)]
    pub min_length: Option<usize>,

    /// Occurrences needed to report a sequence.
    #[arg(long)]
    pub min_occurrences: Option<usize>,

    /// Search only this sequence, e.g. "Read -> Edit".
    #[arg(short = 'p', long)]
    pub pattern: Option<String>,

    /// Ignore built-in tools.
    #[arg(long)]
    pub no_builtin: bool,

    #[command(flatten)]
    pub time: TimeWindowArgs,
}

/// Arguments for the churn command.
#[derive(Debug, Args)]
pub struct ChurnArgs {
    /// Session JSONL file.
    pub session: PathBuf,

    /// Accesses needed to report a file.
    #[arg(short = 't', long)]
    pub threshold: Option<usize>,
}

/// Arguments for the idle command.
#[derive(Debug, Args)]
pub struct IdleArgs {
    /// Session JSONL file.
    pub session: PathBuf,

    /// Gap, in minutes, that counts as idle.
    #[arg(short = 't', long)]
    pub threshold_minutes: Option<u64>,
}

/// Statistics subcommands.
#[derive(Debug, Subcommand)]
pub enum StatsCommand {
    /// Counts, duration, error rate and top tools.
    Session(SessionArg),
    /// Read/edit/write and error counts per file.
    Files(FileStatsArgs),
    /// Tool-call metric per time bucket.
    Timeseries(TimeSeriesArgs),
    /// Tool-call metrics grouped by tool, status or entry.
    Aggregate(AggregateArgs),
}

/// Arguments for `stats files`.
#[derive(Debug, Args)]
pub struct FileStatsArgs {
    /// Session JSONL file.
    pub session: PathBuf,

    /// Sort key (read_count, edit_count, write_count, error_count, error_rate, total_ops).
    #[arg(long)]
    pub sort_by: Option<FileStatsSort>,
}

/// Arguments for `stats timeseries`.
#[derive(Debug, Args)]
pub struct TimeSeriesArgs {
    /// Session JSONL file.
    pub session: PathBuf,

    /// Metric (tool-calls, error-rate).
    #[arg(short = 'm', long)]
    pub metric: Option<Metric>,

    /// Bucket size (hour, day, week).
    #[arg(short = 'i', long)]
    pub interval: Option<Interval>,
}

/// Arguments for `stats aggregate`.
#[derive(Debug, Args)]
pub struct AggregateArgs {
    /// Session JSONL file.
    pub session: PathBuf,

    /// Grouping field (tool, status, uuid).
    #[arg(short = 'g', long)]
    pub group_by: Option<GroupBy>,

    /// Comma-separated metrics (count, error_rate).
    #[arg(short = 'm', long, value_delimiter = ',', default_value = "count")]
    pub metrics: Vec<AggregateMetric>,

    /// Filter expression over tool calls, e.g. "status = 'error'".
    #[arg(long)]
    pub filter: Option<String>,

    #[command(flatten)]
    pub time: TimeWindowArgs,
}

/// Message view subcommands.
#[derive(Debug, Subcommand)]
pub enum MessagesCommand {
    /// Messages typed by the user.
    User(UserMessagesArgs),
    /// Assistant responses.
    Assistant(AssistantMessagesArgs),
    /// User prompts paired with the response that followed.
    Conversation(ConversationArgs),
}

/// Options shared by the message views.
#[derive(Debug, Args)]
pub struct PageArgs {
    /// Regular expression matched against message text.
    #[arg(short = 'p', long)]
    pub pattern: Option<String>,

    /// Sort descending.
    #[arg(long)]
    pub reverse: bool,

    /// Results skipped before the limit applies.
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Maximum number of results.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

/// Arguments for `messages user`.
#[derive(Debug, Args)]
pub struct UserMessagesArgs {
    /// Session JSONL file.
    pub session: PathBuf,

    /// Turns of context shown on each side.
    #[arg(short = 'c', long, default_value_t = 0)]
    pub context: usize,

    /// Sort key (turn_sequence, timestamp, uuid).
    #[arg(long)]
    pub sort_by: Option<UserMessageSort>,

    #[command(flatten)]
    pub page: PageArgs,
}

/// Arguments for `messages assistant`.
#[derive(Debug, Args)]
pub struct AssistantMessagesArgs {
    /// Session JSONL file.
    pub session: PathBuf,

    /// Fewest tool uses.
    #[arg(long)]
    pub min_tools: Option<usize>,

    /// Most tool uses.
    #[arg(long)]
    pub max_tools: Option<usize>,

    /// Fewest output tokens.
    #[arg(long)]
    pub min_tokens_output: Option<u64>,

    /// Shortest text, in characters.
    #[arg(long)]
    pub min_length: Option<usize>,

    /// Longest text, in characters.
    #[arg(long)]
    pub max_length: Option<usize>,

    /// Sort key (turn, timestamp, tool_use_count, text_length).
    #[arg(long)]
    pub sort_by: Option<AssistantMessageSort>,

    #[command(flatten)]
    pub page: PageArgs,
}

/// Arguments for `messages conversation`.
#[derive(Debug, Args)]
pub struct ConversationArgs {
    /// Session JSONL file.
    pub session: PathBuf,

    /// First turn kept.
    #[arg(long)]
    pub start_turn: Option<usize>,

    /// Last turn kept.
    #[arg(long)]
    pub end_turn: Option<usize>,

    /// Side the pattern is matched against (user, assistant, any).
    #[arg(long)]
    pub pattern_target: Option<PatternTarget>,

    /// Shortest response time in milliseconds.
    #[arg(long)]
    pub min_duration_ms: Option<i64>,

    /// Longest response time in milliseconds.
    #[arg(long)]
    pub max_duration_ms: Option<i64>,

    /// Sort key (turn, timestamp, duration).
    #[arg(long)]
    pub sort_by: Option<ConversationSort>,

    #[command(flatten)]
    pub page: PageArgs,
}

/// Arguments for the prompts command.
#[derive(Debug, Args)]
pub struct PromptsArgs {
    /// Session JSONL file.
    pub session: PathBuf,

    /// Lowest quality score reported.
    #[arg(long)]
    pub min_quality: Option<f64>,

    /// Maximum number of prompts.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

/// Arguments for the project-state command.
#[derive(Debug, Args)]
pub struct ProjectStateArgs {
    /// Session JSONL file.
    pub session: PathBuf,

    /// Include assistant text mentioning unfinished work.
    #[arg(long)]
    pub include_incomplete: bool,
}

/// Arguments for the file-access command.
#[derive(Debug, Args)]
pub struct FileAccessArgs {
    /// Session JSONL file.
    pub session: PathBuf,

    /// File path, or a bare file name matched against basenames.
    #[arg(long)]
    pub file: String,

    #[command(flatten)]
    pub time: TimeWindowArgs,
}

/// Arguments for the context command.
#[derive(Debug, Args)]
pub struct ContextArgs {
    /// Session JSONL file.
    pub session: PathBuf,

    /// Error signature, as reported by `errors`.
    #[arg(short = 's', long)]
    pub signature: String,

    /// Turns shown on each side.
    #[arg(short = 'w', long, allow_negative_numbers = true)]
    pub window: Option<i64>,
}

/// Arguments for the tools command.
#[derive(Debug, Args)]
pub struct ToolsArgs {
    /// Session JSONL file.
    pub session: PathBuf,

    /// Keep only failed (error) or successful (success) calls.
    #[arg(long)]
    pub status: Option<ToolStatusFilter>,

    /// Exact tool name.
    #[arg(short = 't', long)]
    pub tool: Option<String>,

    /// Filter expression, e.g. "tool = 'Bash' AND status = 'error'".
    #[arg(short = 'w', long = "where")]
    pub where_clause: Option<String>,

    /// Sort key (timestamp, tool, status, uuid).
    #[arg(long)]
    pub sort_by: Option<ToolSort>,

    /// Sort descending.
    #[arg(long)]
    pub reverse: bool,

    /// Calls skipped before the limit applies.
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Maximum number of calls.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    #[command(flatten)]
    pub time: TimeWindowArgs,
}

/// Initialize tracing based on CLI options. Logs go to stderr.
fn init_logging(cli: &Cli) {
    use tracing_subscriber::{
        fmt::{self, format::FmtSpan},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_filter_string()));
    let registry = tracing_subscriber::registry().with(filter);

    let result = match cli.log_format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => registry.with(fmt::layer().with_writer(std::io::stderr)).try_init(),
    };

    if let Err(e) = result {
        eprintln!("Warning: Could not initialize logging: {e}");
    }
}

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let cwd = std::env::current_dir().map_err(|e| MetaError::io("Failed to read current directory", e))?;
    let config = Config::resolve(cli.config.as_deref(), &cwd)?;
    debug!(?config, "Resolved configuration");

    let ctx = CommandContext::new(config, cli.pretty);
    dispatch(&ctx, &cli.command)
}

/// Write `err` the way the binary reports it on stderr.
///
/// Errors confined to one line or value get a hint about lenient loading.
pub fn report_error<W: Write>(out: &mut W, err: &MetaError, show_source: bool) -> io::Result<()> {
    writeln!(out, "Error: {err}")?;

    if show_source {
        if let Some(source) = std::error::Error::source(err) {
            writeln!(out, "Caused by: {source}")?;
        }
    }

    if err.is_recoverable() {
        writeln!(
            out,
            "Hint: the rest of the transcript is readable; set `lenient = true` under [parser] to skip bad lines"
        )?;
    }
    Ok(())
}

fn dispatch(ctx: &CommandContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Query(args) => commands::query::run(ctx, args),
        Commands::Errors(args) => commands::patterns::run_errors(ctx, args),
        Commands::Sequences(args) => commands::patterns::run_sequences(ctx, args),
        Commands::Churn(args) => commands::patterns::run_churn(ctx, args),
        Commands::Idle(args) => commands::patterns::run_idle(ctx, args),
        Commands::Stats(command) => commands::stats::run(ctx, command),
        Commands::Messages(command) => commands::messages::run(ctx, command),
        Commands::Prompts(args) => commands::state::run_prompts(ctx, args),
        Commands::ProjectState(args) => commands::state::run_project_state(ctx, args),
        Commands::FileAccess(args) => commands::state::run_file_access(ctx, args),
        Commands::Context(args) => commands::state::run_context(ctx, args),
        Commands::Tools(args) => commands::tools::run(ctx, args),
    }
}
