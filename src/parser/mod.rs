//! JSONL parsing for Claude Code session logs.
//!
//! The parser loads a whole transcript into memory as an ordered list of
//! [`SessionEntry`] values, which every analysis in this crate consumes.
//!
//! # Example
//!
//! ```rust,no_run
//! use claude_meta::parser::JsonlParser;
//!
//! let mut parser = JsonlParser::new().with_lenient(true);
//! let entries = parser.parse_file("session.jsonl")?;
//! println!("Parsed {} entries", entries.len());
//! println!("Success rate: {:.1}%", parser.stats().success_rate());
//! # Ok::<(), claude_meta::MetaError>(())
//! ```
//!
//! # Parsing Modes
//!
//! - **Lenient mode** (default): Skips malformed lines and records them
//! - **Strict mode**: Fails on the first malformed line

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, instrument, trace, warn};

use crate::error::{MetaError, Result};
use crate::model::SessionEntry;
use crate::util::truncate_chars;

/// Default maximum file size (unlimited).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 0;

/// Characters of a malformed line kept in [`ParseError::content_preview`].
const PREVIEW_CHARS: usize = 100;

/// JSONL parser for Claude Code session logs.
#[derive(Debug)]
pub struct JsonlParser {
    /// Whether to skip malformed lines instead of failing.
    lenient: bool,
    /// Maximum file size in bytes (0 = unlimited).
    max_file_size: u64,
    /// Statistics about the last parse.
    stats: ParseStats,
}

/// Statistics about parsing operations.
#[derive(Debug, Clone, Default)]
pub struct ParseStats {
    /// Total lines processed.
    pub lines_processed: usize,
    /// Successfully parsed entries.
    pub entries_parsed: usize,
    /// Malformed/skipped lines.
    pub lines_skipped: usize,
    /// Empty lines.
    pub empty_lines: usize,
    /// Parsing errors encountered.
    pub errors: Vec<ParseError>,
}

impl ParseStats {
    /// Calculate success rate as percentage.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.lines_processed == 0 {
            return 100.0;
        }
        let valid = self.lines_processed - self.empty_lines;
        if valid == 0 {
            return 0.0;
        }
        (self.entries_parsed as f64 / valid as f64) * 100.0
    }
}

/// A parsing error with context.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Line number where error occurred.
    pub line: usize,
    /// Error message.
    pub message: String,
    /// Original line content (truncated).
    pub content_preview: String,
}

impl JsonlParser {
    /// Create a new parser with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lenient: true,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            stats: ParseStats::default(),
        }
    }

    /// Set lenient mode (skip malformed lines instead of failing).
    #[must_use]
    pub fn with_lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Set maximum file size in bytes (0 = unlimited).
    #[must_use]
    pub fn with_max_file_size(mut self, max_bytes: u64) -> Self {
        self.max_file_size = max_bytes;
        self
    }

    /// Get parse statistics.
    #[must_use]
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Parse a JSONL file from a path.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<SessionEntry>> {
        let path = path.as_ref();
        debug!("Opening file for parsing");

        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MetaError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => MetaError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => MetaError::io(format!("Failed to open {}", path.display()), e),
        })?;

        if self.max_file_size > 0 {
            let metadata = file
                .metadata()
                .map_err(|e| MetaError::io(format!("Failed to get metadata for {}", path.display()), e))?;
            let file_size = metadata.len();
            trace!(file_size, max_size = self.max_file_size, "Checking file size limit");

            if file_size > self.max_file_size {
                return Err(MetaError::InvalidSessionFile {
                    path: path.to_path_buf(),
                    reason: format!(
                        "file size ({}) exceeds maximum ({})",
                        format_bytes(file_size),
                        format_bytes(self.max_file_size)
                    ),
                });
            }
        }

        self.parse_reader(BufReader::new(file))
    }

    /// Parse JSONL from a reader.
    #[instrument(skip(self, reader), level = "debug")]
    pub fn parse_reader<R: BufRead>(&mut self, reader: R) -> Result<Vec<SessionEntry>> {
        let mut entries = Vec::new();
        self.stats = ParseStats::default();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line_num = line_num + 1;
            self.stats.lines_processed += 1;

            let line = match line_result {
                Ok(l) => l,
                Err(e) => {
                    if self.lenient {
                        self.stats.lines_skipped += 1;
                        self.stats.errors.push(ParseError {
                            line: line_num,
                            message: format!("I/O error: {e}"),
                            content_preview: String::new(),
                        });
                        warn!(line = line_num, error = %e, "I/O error reading line, skipping");
                        continue;
                    }
                    return Err(MetaError::io(format!("Failed to read line {line_num}"), e));
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                self.stats.empty_lines += 1;
                continue;
            }

            match Self::parse_line(trimmed, line_num) {
                Ok(entry) => {
                    self.stats.entries_parsed += 1;
                    entries.push(entry);
                }
                Err(e) => {
                    if self.lenient {
                        self.stats.lines_skipped += 1;
                        self.stats.errors.push(ParseError {
                            line: line_num,
                            message: e.to_string(),
                            content_preview: truncate_chars(trimmed, PREVIEW_CHARS),
                        });
                        trace!(line = line_num, error = %e, "Parse error, skipping line");
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        debug!(
            entries = entries.len(),
            lines = self.stats.lines_processed,
            skipped = self.stats.lines_skipped,
            "Parsing complete"
        );
        Ok(entries)
    }

    fn parse_line(line: &str, line_num: usize) -> Result<SessionEntry> {
        serde_json::from_str(line).map_err(|e| MetaError::parse_with_source(line_num, e.to_string(), e))
    }

    /// Parse JSONL from a string.
    pub fn parse_str(&mut self, content: &str) -> Result<Vec<SessionEntry>> {
        self.parse_reader(content.as_bytes())
    }

    /// Parse a single entry from a JSON string.
    pub fn parse_entry(json: &str) -> Result<SessionEntry> {
        Self::parse_line(json, 0)
    }
}

impl Default for JsonlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Format bytes in a human-readable format.
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const USER_LINE: &str = r#"{"uuid":"u1","parentUuid":null,"type":"user","timestamp":"2025-10-02T10:00:00Z","sessionId":"s1","version":"2.0.5","gitBranch":"main","message":{"role":"user","content":"Hello"}}"#;

    #[test]
    fn test_parse_empty() {
        let mut parser = JsonlParser::new();
        let entries = parser.parse_str("").unwrap();
        assert!(entries.is_empty());
        assert_eq!(parser.stats().success_rate(), 100.0);
    }

    #[test]
    fn test_parse_single_user_message() {
        let mut parser = JsonlParser::new();
        let entries = parser.parse_str(USER_LINE).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry_type, "user");
        assert_eq!(entries[0].uuid, "u1");
        assert_eq!(entries[0].version, "2.0.5");
    }

    #[test]
    fn test_lenient_parsing() {
        let content = format!("{USER_LINE}\ninvalid json line\n{USER_LINE}");

        let mut parser = JsonlParser::new().with_lenient(true);
        let entries = parser.parse_str(&content).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(parser.stats().lines_skipped, 1);
        assert_eq!(parser.stats().errors[0].line, 2);
        assert_eq!(parser.stats().errors[0].content_preview, "invalid json line");
    }

    #[test]
    fn test_strict_parsing_reports_line() {
        let content = format!("{USER_LINE}\n{{broken");

        let mut parser = JsonlParser::new().with_lenient(false);
        let err = parser.parse_str(&content).unwrap_err();

        assert!(matches!(err, MetaError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_parse_stats() {
        let content = format!("{USER_LINE}\n\n{USER_LINE}\nbad\n");

        let mut parser = JsonlParser::new().with_lenient(true);
        let entries = parser.parse_str(&content).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(parser.stats().lines_processed, 4);
        assert_eq!(parser.stats().empty_lines, 1);
        assert_eq!(parser.stats().lines_skipped, 1);
        assert_eq!(parser.stats().entries_parsed, 2);
        assert!((parser.stats().success_rate() - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_parse_file_not_found() {
        let mut parser = JsonlParser::new();
        let err = parser.parse_file("/nonexistent/session.jsonl").unwrap_err();
        assert!(matches!(err, MetaError::FileNotFound { .. }));
    }

    #[test]
    fn test_max_file_size() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{USER_LINE}").unwrap();

        let mut parser = JsonlParser::new().with_max_file_size(10);
        let err = parser.parse_file(file.path()).unwrap_err();
        assert!(matches!(err, MetaError::InvalidSessionFile { .. }));

        let mut parser = JsonlParser::new().with_max_file_size(0);
        assert_eq!(parser.parse_file(file.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_entry() {
        let entry = JsonlParser::parse_entry(USER_LINE).unwrap();
        assert_eq!(entry.session_id, "s1");
        assert!(JsonlParser::parse_entry("nope").is_err());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
