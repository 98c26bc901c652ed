//! Prompt/response pairs.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::assistant::AssistantMessage;
use super::messages::{compile_pattern, is_system_message, UserMessage};
use super::sort_directed;
use crate::error::{Result, ValidationError};
use crate::model::SessionEntry;
use crate::turns::TurnIndex;
use crate::util::{paginate, parse_timestamp};

/// Which side of a turn a pattern is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PatternTarget {
    /// The user prompt.
    User,
    /// The assistant text blocks.
    Assistant,
    /// Either side.
    #[default]
    Any,
}

impl FromStr for PatternTarget {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "any" => Ok(Self::Any),
            _ => Err(ValidationError::new("pattern_target", s, &["user", "assistant", "any"])),
        }
    }
}

/// Sort key for conversation turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConversationSort {
    /// Turn number.
    #[default]
    Turn,
    /// Timestamp string.
    Timestamp,
    /// Response duration.
    Duration,
}

impl FromStr for ConversationSort {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "turn" | "turn_sequence" => Ok(Self::Turn),
            "timestamp" => Ok(Self::Timestamp),
            "duration" => Ok(Self::Duration),
            _ => Err(ValidationError::new("sort_by", s, &["turn_sequence", "timestamp", "duration"])),
        }
    }
}

/// Options for [`build_conversation_turns`]. `None` bounds are unchecked.
#[derive(Debug, Clone, Default)]
pub struct ConversationOptions {
    /// First turn kept.
    pub start_turn: Option<usize>,
    /// Last turn kept.
    pub end_turn: Option<usize>,
    /// Regex a turn must match.
    pub pattern: Option<String>,
    /// Side the pattern applies to.
    pub pattern_target: PatternTarget,
    /// Minimum response duration in milliseconds.
    pub min_duration_ms: Option<i64>,
    /// Maximum response duration in milliseconds.
    pub max_duration_ms: Option<i64>,
    /// Maximum results (0 = no limit).
    pub limit: usize,
    /// Results skipped before the limit applies.
    pub offset: usize,
    /// Sort key.
    pub sort_by: ConversationSort,
    /// Sort descending.
    pub reverse: bool,
}

/// A user prompt and the response that answered it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Turn of the prompt, or of the response when there is no prompt.
    pub turn_sequence: usize,
    /// The prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_message: Option<UserMessage>,
    /// The response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_message: Option<AssistantMessage>,
    /// Response time in milliseconds; 0 unless both sides have timestamps.
    pub duration_ms: i64,
    /// Prompt timestamp, else response timestamp.
    pub timestamp: String,
}

impl ConversationTurn {
    fn from_user(user: UserMessage) -> Self {
        Self {
            turn_sequence: user.turn_sequence,
            timestamp: user.timestamp.clone(),
            user_message: Some(user),
            ..Self::default()
        }
    }

    fn from_assistant(assistant: AssistantMessage) -> Self {
        Self {
            turn_sequence: assistant.turn_sequence,
            timestamp: assistant.timestamp.clone(),
            assistant_message: Some(assistant),
            ..Self::default()
        }
    }

    fn awaits_response(&self) -> bool {
        self.user_message.is_some() && self.assistant_message.is_none()
    }

    fn answer(&mut self, assistant: AssistantMessage) {
        if let Some(user) = &self.user_message {
            self.duration_ms = duration_ms(&user.timestamp, &assistant.timestamp);
        }
        self.assistant_message = Some(assistant);
    }

    fn matches(&self, re: &regex::Regex, target: PatternTarget) -> bool {
        let user = matches!(target, PatternTarget::User | PatternTarget::Any)
            && self.user_message.as_ref().is_some_and(|u| re.is_match(&u.content));
        let assistant = matches!(target, PatternTarget::Assistant | PatternTarget::Any)
            && self.assistant_message.as_ref().is_some_and(|a| {
                a.content_blocks
                    .iter()
                    .filter_map(|b| b.text.as_deref())
                    .any(|t| re.is_match(t))
            });
        user || assistant
    }
}

fn duration_ms(from: &str, to: &str) -> i64 {
    match (parse_timestamp(from), parse_timestamp(to)) {
        (Some(start), Some(end)) => (end - start).num_milliseconds(),
        _ => 0,
    }
}

fn pair_turns(entries: &[SessionEntry], turn_index: &TurnIndex) -> Vec<ConversationTurn> {
    let mut turns = Vec::new();
    let mut open: Option<ConversationTurn> = None;

    for entry in entries {
        let turn = turn_index.get(&entry.uuid).unwrap_or_default();
        if entry.is_user() && entry.message.is_some() {
            let content = entry.concatenated_text();
            if content.is_empty() || is_system_message(&content) {
                continue;
            }
            turns.extend(open.take());
            open = Some(ConversationTurn::from_user(UserMessage {
                turn_sequence: turn,
                uuid: entry.uuid.clone(),
                timestamp: entry.timestamp.clone(),
                content,
                ..UserMessage::default()
            }));
        } else if let Some(assistant) = AssistantMessage::from_entry(entry, turn) {
            match open.as_mut().filter(|t| t.awaits_response()) {
                Some(pending) => pending.answer(assistant),
                None => {
                    turns.extend(open.take());
                    open = Some(ConversationTurn::from_assistant(assistant));
                }
            }
        }
    }
    turns.extend(open);
    turns
}

/// Pair each user prompt with its response, then filter, sort and paginate.
#[instrument(skip(entries), fields(entries = entries.len()))]
pub fn build_conversation_turns(entries: &[SessionEntry], opts: &ConversationOptions) -> Result<Vec<ConversationTurn>> {
    let pattern = compile_pattern(opts.pattern.as_deref())?;
    let turn_index = TurnIndex::build(entries);

    let mut turns: Vec<ConversationTurn> = pair_turns(entries, &turn_index)
        .into_iter()
        .filter(|t| opts.start_turn.map_or(true, |s| t.turn_sequence >= s))
        .filter(|t| opts.end_turn.map_or(true, |e| t.turn_sequence <= e))
        .filter(|t| pattern.as_ref().map_or(true, |re| t.matches(re, opts.pattern_target)))
        .filter(|t| opts.min_duration_ms.map_or(true, |m| t.duration_ms >= m))
        .filter(|t| opts.max_duration_ms.map_or(true, |m| t.duration_ms <= m))
        .collect();

    sort_directed(&mut turns, opts.reverse, |a, b| match opts.sort_by {
        ConversationSort::Turn => a.turn_sequence.cmp(&b.turn_sequence),
        ConversationSort::Timestamp => a.timestamp.cmp(&b.timestamp),
        ConversationSort::Duration => a.duration_ms.cmp(&b.duration_ms),
    });

    let turns = paginate(turns, opts.offset, opts.limit);
    debug!(turns = turns.len(), "Built conversation turns");
    Ok(turns)
}
