//! Scoring of user prompts by what followed them.
//!
//! Each prompt is judged on everything after it in the transcript: tool
//! failures, distinct tool outputs (deliverables), how many message entries
//! followed, and whether an assistant reported the work "completed". The
//! score starts at 1.0 and is multiplied down by each penalty.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::messages::is_system_message;
use crate::model::SessionEntry;
use crate::turns::TurnIndex;

/// Default minimum quality score.
pub const DEFAULT_MIN_QUALITY: f64 = 0.8;

/// Default number of prompts returned.
pub const DEFAULT_PROMPT_LIMIT: usize = 10;

/// Outcome status when an assistant reported completion.
pub const STATUS_COMPLETED: &str = "completed";

/// Outcome status otherwise.
pub const STATUS_IN_PROGRESS: &str = "in-progress";

const ERROR_PENALTY: f64 = 0.5;
const LONG_RUN_PENALTY: f64 = 0.7;
const LONG_RUN_TURNS: usize = 4;
const NO_DELIVERABLE_PENALTY: f64 = 0.8;
const VERBOSE_PENALTY: f64 = 0.9;
const VERBOSE_CHARS: usize = 300;

/// Result wrapper, serialized as `{"prompts": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuccessfulPromptsResult {
    /// Prompts by score, best first.
    pub prompts: Vec<SuccessfulPrompt>,
}

/// A scored user prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuccessfulPrompt {
    /// Turn of the prompt.
    pub turn_sequence: usize,
    /// Prompt text, trimmed.
    pub user_prompt: String,
    /// Keyword-derived context.
    pub context: PromptContext,
    /// What followed the prompt.
    pub outcome: PromptOutcome,
    /// Score in `0.0..=1.0`.
    pub quality_score: f64,
    /// Keyword-derived prompt features.
    pub pattern_features: PatternFeatures,
}

/// Phase and task type mentioned by a prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptContext {
    /// `"phase"` when the prompt mentions one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// `"refactor"` or `"bugfix"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
}

/// What happened after a prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptOutcome {
    /// [`STATUS_COMPLETED`] or [`STATUS_IN_PROGRESS`].
    pub status: String,
    /// Message entries after the prompt.
    pub turns_to_complete: usize,
    /// Failed tool results after the prompt.
    pub error_count: usize,
    /// Distinct non-empty tool outputs, sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deliverables: Vec<String>,
}

/// Structural features of a prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternFeatures {
    /// Mentions a goal or need.
    pub has_clear_goal: bool,
    /// Mentions a constraint or "must".
    pub has_constraints: bool,
    /// Mentions acceptance criteria.
    pub has_acceptance_criteria: bool,
    /// Mentions context or background.
    pub has_context: bool,
}

impl PatternFeatures {
    fn from_prompt(prompt: &str) -> Self {
        let lower = prompt.to_lowercase();
        let any = |words: &[&str]| words.iter().any(|w| lower.contains(w));
        Self {
            has_clear_goal: any(&["goal", "need"]),
            has_constraints: any(&["must", "constraint"]),
            has_acceptance_criteria: any(&["acceptance", "criteria"]),
            has_context: any(&["context", "background"]),
        }
    }
}

impl PromptContext {
    fn from_prompt(prompt: &str) -> Self {
        let lower = prompt.to_lowercase();
        let task_type = if lower.contains("refactor") {
            Some("refactor")
        } else if lower.contains("bug") {
            Some("bugfix")
        } else {
            None
        };
        Self {
            phase: lower.contains("phase").then(|| "phase".to_string()),
            task_type: task_type.map(str::to_string),
        }
    }
}

/// Scan every entry after a prompt.
fn analyze_outcome(following: &[SessionEntry]) -> PromptOutcome {
    let mut deliverables = BTreeSet::new();
    let mut outcome = PromptOutcome {
        status: STATUS_IN_PROGRESS.to_string(),
        ..PromptOutcome::default()
    };

    for entry in following {
        let Some(message) = &entry.message else {
            continue;
        };
        outcome.turns_to_complete += 1;

        for result in message.tool_results() {
            if result.is_failure() {
                outcome.error_count += 1;
            } else if !result.content.is_empty() {
                deliverables.insert(result.content.clone());
            }
        }
        if entry.is_assistant() && message.texts().any(|t| t.to_lowercase().contains(STATUS_COMPLETED)) {
            outcome.status = STATUS_COMPLETED.to_string();
        }
    }

    outcome.deliverables = deliverables.into_iter().collect();
    outcome
}

/// Quality score of a prompt given its outcome.
#[must_use]
pub fn calculate_quality_score(outcome: &PromptOutcome, prompt: &str) -> f64 {
    let mut score: f64 = 1.0;
    if outcome.error_count > 0 {
        score *= ERROR_PENALTY;
    }
    if outcome.turns_to_complete > LONG_RUN_TURNS {
        score *= LONG_RUN_PENALTY;
    }
    if outcome.deliverables.is_empty() {
        score *= NO_DELIVERABLE_PENALTY;
    }
    if prompt.chars().count() > VERBOSE_CHARS {
        score *= VERBOSE_PENALTY;
    }
    score.min(1.0)
}

/// Score every user prompt and keep those at or above `min_quality`, best
/// first (ties by turn), at most `limit` (0 = no limit).
#[instrument(skip(entries), fields(entries = entries.len()))]
pub fn build_successful_prompts(entries: &[SessionEntry], min_quality: f64, limit: usize) -> SuccessfulPromptsResult {
    let turn_index = TurnIndex::build(entries);

    let mut prompts: Vec<SuccessfulPrompt> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_user() && e.message.is_some())
        .filter_map(|(i, entry)| {
            let text = entry.concatenated_text().trim().to_string();
            if text.is_empty() || is_system_message(&text) {
                return None;
            }
            let outcome = analyze_outcome(&entries[i + 1..]);
            let quality_score = calculate_quality_score(&outcome, &text);
            (quality_score >= min_quality).then(|| SuccessfulPrompt {
                turn_sequence: turn_index.get(&entry.uuid).unwrap_or_default(),
                context: PromptContext::from_prompt(&text),
                pattern_features: PatternFeatures::from_prompt(&text),
                user_prompt: text,
                outcome,
                quality_score,
            })
        })
        .collect();

    prompts.sort_by(|a, b| {
        b.quality_score
            .total_cmp(&a.quality_score)
            .then(a.turn_sequence.cmp(&b.turn_sequence))
    });
    if limit > 0 {
        prompts.truncate(limit);
    }

    debug!(prompts = prompts.len(), "Scored prompts");
    SuccessfulPromptsResult { prompts }
}
