//! Synthetic session transcript generators.
//!
//! Builds Claude Code JSONL transcripts for tests and benchmarks: user
//! prompts, assistant text, tool calls with their results, snapshots and
//! idle gaps, all timestamped from a configurable start.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use claude_meta::model::SessionEntry;
use claude_meta::parser::JsonlParser;
use serde::Serialize;
use serde_json::Value;
use std::io::Write;
use uuid::Uuid;

/// One JSONL line.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Line {
    #[serde(rename = "type")]
    entry_type: String,
    uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_uuid: Option<String>,
    session_id: String,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<MessageLine>,
}

#[derive(Debug, Serialize)]
struct MessageLine {
    role: String,
    content: Vec<Block>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<Usage>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Block {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        is_error: bool,
    },
}

#[derive(Debug, Serialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

/// Builder for a synthetic session.
///
/// Every added entry advances the clock by `step`; [`SessionBuilder::idle`]
/// advances it without adding anything.
#[derive(Debug)]
pub struct SessionBuilder {
    session_id: String,
    clock: DateTime<Utc>,
    step: Duration,
    parent: Option<String>,
    lines: Vec<Line>,
    next_tool: usize,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    /// Start a session at 2025-10-02T10:00:00Z with one-second steps.
    pub fn new() -> Self {
        Self {
            session_id: format!("test-session-{}", Uuid::new_v4()),
            clock: Utc.with_ymd_and_hms(2025, 10, 2, 10, 0, 0).unwrap(),
            step: Duration::seconds(1),
            parent: None,
            lines: Vec::new(),
            next_tool: 0,
        }
    }

    /// Use a fixed session ID.
    pub fn session_id(mut self, id: &str) -> Self {
        self.session_id = id.to_string();
        self
    }

    /// Time between consecutive entries.
    pub fn step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    /// A user prompt.
    pub fn user(mut self, text: &str) -> Self {
        self.push(
            "user",
            Some(MessageLine {
                role: "user".into(),
                content: vec![Block::Text { text: text.into() }],
                model: None,
                usage: None,
            }),
        );
        self
    }

    /// An assistant reply with text only.
    pub fn assistant(mut self, text: &str) -> Self {
        self.push("assistant", Some(assistant_message(vec![Block::Text { text: text.into() }])));
        self
    }

    /// An assistant `tool_use` followed by a user entry carrying its result.
    pub fn tool_call(self, name: &str, input: Value, output: &str, is_error: bool) -> Self {
        self.tool_use(name, input, Some((output, is_error)))
    }

    /// An assistant `tool_use`, with a result entry when `result` is set.
    pub fn tool_use(mut self, name: &str, input: Value, result: Option<(&str, bool)>) -> Self {
        self.next_tool += 1;
        let id = format!("toolu_{:04}", self.next_tool);
        self.push(
            "assistant",
            Some(assistant_message(vec![Block::ToolUse {
                id: id.clone(),
                name: name.into(),
                input,
            }])),
        );
        if let Some((output, is_error)) = result {
            self.push(
                "user",
                Some(MessageLine {
                    role: "user".into(),
                    content: vec![Block::ToolResult {
                        tool_use_id: id,
                        content: output.into(),
                        is_error,
                    }],
                    model: None,
                    usage: None,
                }),
            );
        }
        self
    }

    /// A `file-history-snapshot` entry.
    pub fn snapshot(mut self) -> Self {
        self.push("file-history-snapshot", None);
        self
    }

    /// A non-message entry of any type.
    pub fn other(mut self, entry_type: &str) -> Self {
        self.push(entry_type, None);
        self
    }

    /// Advance the clock.
    pub fn idle(mut self, minutes: i64) -> Self {
        self.clock = self.clock + Duration::minutes(minutes);
        self
    }

    /// Render the session as JSONL.
    pub fn to_jsonl(&self) -> String {
        let mut out = Vec::new();
        self.write_to(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    /// Write the session as JSONL.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for line in &self.lines {
            writeln!(writer, "{}", serde_json::to_string(line)?)?;
        }
        Ok(())
    }

    /// Parse the rendered session.
    pub fn entries(&self) -> Vec<SessionEntry> {
        JsonlParser::new()
            .with_lenient(false)
            .parse_str(&self.to_jsonl())
            .unwrap()
    }

    fn push(&mut self, entry_type: &str, message: Option<MessageLine>) {
        let uuid = Uuid::new_v4().to_string();
        self.lines.push(Line {
            entry_type: entry_type.into(),
            uuid: uuid.clone(),
            parent_uuid: self.parent.clone(),
            session_id: self.session_id.clone(),
            timestamp: self.clock.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            message,
        });
        self.parent = Some(uuid);
        self.clock = self.clock + self.step;
    }
}

fn assistant_message(content: Vec<Block>) -> MessageLine {
    MessageLine {
        role: "assistant".into(),
        content,
        model: Some("claude-sonnet-4-20250514".into()),
        usage: Some(Usage {
            input_tokens: 100,
            output_tokens: 20,
        }),
    }
}

/// Default input for a tool, shaped like the real one.
pub fn tool_input(name: &str, n: usize) -> Value {
    match name {
        "Read" | "Edit" | "Write" => serde_json::json!({"file_path": format!("src/file_{}.rs", n % 4)}),
        "Bash" => serde_json::json!({"command": "cargo test"}),
        "Grep" | "Glob" => serde_json::json!({"pattern": "fn main"}),
        _ => serde_json::json!({}),
    }
}

/// A session whose tool calls follow `tools` in order, all successful.
pub fn tool_sequence_session(tools: &[&str]) -> SessionBuilder {
    tools.iter().enumerate().fold(SessionBuilder::new(), |builder, (i, tool)| {
        builder.tool_call(tool, tool_input(tool, i), "ok", false)
    })
}

/// A realistic workload of `exchanges` prompt/work/summary rounds.
///
/// Every round reads, edits and tests a file; every third test fails and is
/// retried, and every fifth round is followed by a ten-minute pause.
pub fn workload_session(exchanges: usize) -> SessionBuilder {
    let mut builder = SessionBuilder::new().session_id("workload");
    for i in 0..exchanges {
        let file = format!("src/module_{}.rs", i % 7);
        builder = builder
            .user(&format!("Please fix the bug in {file}"))
            .tool_call("Read", serde_json::json!({"file_path": file}), "fn main() {}", false)
            .tool_call("Edit", serde_json::json!({"file_path": file}), "ok", false);
        if i % 3 == 0 {
            builder = builder.tool_call(
                "Bash",
                serde_json::json!({"command": "cargo test"}),
                "error[E0308]: mismatched types",
                true,
            );
        }
        builder = builder
            .tool_call("Bash", serde_json::json!({"command": "cargo test"}), "test result: ok", false)
            .assistant(&format!("Fix for {file} completed."));
        if i % 5 == 4 {
            builder = builder.snapshot().idle(10);
        }
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_lines_are_valid_json() {
        let jsonl = SessionBuilder::new()
            .user("hi")
            .tool_call("Read", tool_input("Read", 0), "ok", false)
            .snapshot()
            .to_jsonl();
        let lines: Vec<&str> = jsonl.lines().collect();
        assert_eq!(lines.len(), 4);
        for line in lines {
            assert!(serde_json::from_str::<Value>(line).is_ok());
        }
    }

    #[test]
    fn test_workload_parses() {
        let entries = workload_session(5).entries();
        // Per round: prompt, 3 tool calls x 2 entries, summary; rounds 0 and 3
        // add a failing call; round 4 adds a snapshot.
        assert_eq!(entries.len(), 5 * 8 + 2 * 2 + 1);
    }
}
