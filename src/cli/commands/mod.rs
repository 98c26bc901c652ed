//! CLI command implementations.
//!
//! Each command loads its session through [`CommandContext::load`] and hands
//! the result to [`CommandContext::emit`].

pub mod messages;
pub mod patterns;
pub mod query;
pub mod state;
pub mod stats;
pub mod tools;

use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{MetaError, Result};
use crate::model::SessionEntry;
use crate::parser::JsonlParser;
use crate::query::TimeFilter;

/// Resolved configuration plus output settings shared by every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Effective configuration.
    pub config: Config,
    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl CommandContext {
    /// `--pretty` on the command line or in the config enables pretty output.
    #[must_use]
    pub fn new(config: Config, pretty: bool) -> Self {
        let pretty = pretty || config.output.pretty;
        Self { config, pretty }
    }

    /// Parse a session transcript with the configured parser settings.
    pub fn load(&self, path: &Path) -> Result<Vec<SessionEntry>> {
        let mut parser = JsonlParser::new()
            .with_lenient(self.config.parser.lenient)
            .with_max_file_size(self.config.parser.max_file_size);
        let entries = parser.parse_file(path)?;

        let stats = parser.stats();
        if stats.lines_skipped > 0 {
            warn!(
                path = %path.display(),
                skipped = stats.lines_skipped,
                "Skipped malformed lines"
            );
        }
        info!(path = %path.display(), entries = entries.len(), "Loaded session");
        Ok(entries)
    }

    /// [`load`](Self::load), then keep the entries inside `window`.
    pub fn load_window(&self, path: &Path, window: &TimeFilter) -> Result<Vec<SessionEntry>> {
        let entries = self.load(path)?;
        window.apply(entries, Utc::now())
    }

    /// Requested limit, else the configured output limit (0 = unlimited).
    #[must_use]
    pub fn limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.config.output.limit)
    }

    /// Write `value` as JSON to stdout.
    pub fn emit<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        write_json(&mut out, value, self.pretty)
    }
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out).map_err(|e| MetaError::io("Failed to write output", e))?;
    out.flush().map_err(|e| MetaError::io("Failed to flush output", e))
}
