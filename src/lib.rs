//! claude-meta: query engine and workflow pattern mining for Claude Code
//! session transcripts.
//!
//! A session transcript is a JSONL file of entries (user and assistant
//! messages, snapshots, system records). This crate loads one transcript and
//! answers questions about it: which tools failed, which sequences of tool
//! calls repeat, which files were touched over and over, where the user went
//! idle, which prompts led to finished work.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use claude_meta::analytics::{detect_error_patterns, detect_tool_sequences};
//! use claude_meta::model::extract_tool_calls;
//! use claude_meta::parser::JsonlParser;
//!
//! fn main() -> claude_meta::Result<()> {
//!     let entries = JsonlParser::new().parse_file("session.jsonl")?;
//!     let calls = extract_tool_calls(&entries);
//!
//!     for pattern in detect_error_patterns(&entries, &calls) {
//!         println!("{} failed {} times: {}", pattern.tool_name, pattern.occurrences, pattern.error_text);
//!     }
//!     for sequence in detect_tool_sequences(&entries, 2, 3)? {
//!         println!("{} x{}", sequence.pattern, sequence.count);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`model`]: Session entries, content blocks and joined tool calls
//! - [`parser`]: JSONL parsing with lenient and strict modes
//! - [`turns`]: Turn numbering shared by every analysis
//! - [`query`]: Unified query pipeline, filter expressions, time windows and derived views
//! - [`analytics`]: Statistics and workflow pattern detection
//! - [`config`]: Configuration management
//! - [`cli`]: Command-line interface
//! - [`error`]: Error types and handling

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod analytics;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod query;
pub mod turns;
pub mod util;

// Re-export commonly used types at the crate root
pub use error::{MetaError, Result};
pub use model::{SessionEntry, ToolCall};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::analytics::{
        detect_error_patterns, detect_file_churn, detect_idle_periods, detect_tool_sequences, SessionStats,
    };
    pub use crate::error::{MetaError, Result};
    pub use crate::model::{extract_tool_calls, ContentBlock, Message, SessionEntry, ToolCall};
    pub use crate::parser::JsonlParser;
    pub use crate::query::{query, QueryParams, QueryResult};
    pub use crate::turns::TurnIndex;
}
