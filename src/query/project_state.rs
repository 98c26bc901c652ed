//! Snapshot of where a session left off.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::model::{FileAction, Message, SessionEntry, ENTRY_TYPE_FILE_SNAPSHOT};
use crate::turns::TurnIndex;

/// Files listed in [`ProjectState::recent_files`].
pub const RECENT_FILES_LIMIT: usize = 10;

/// Achievements listed in [`ProjectState::recent_achievements`].
pub const RECENT_ACHIEVEMENTS_LIMIT: usize = 5;

/// Options for [`build_project_state`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectStateOptions {
    /// Collect assistant text mentioning unfinished work.
    pub include_incomplete: bool,
}

/// Where the session stands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectState {
    /// Session ID of the first entry.
    pub session_id: String,
    /// Most recently touched files.
    pub recent_files: Vec<FileActivity>,
    /// Unfinished work mentioned by the assistant.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub incomplete_stages: Vec<IncompleteTask>,
    /// Message entries since the last failed tool result.
    pub last_error_free_turns: usize,
    /// Last non-blank assistant text.
    pub current_focus: String,
    /// Latest assistant texts reporting finished work, newest first.
    pub recent_achievements: Vec<String>,
}

/// Activity on one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileActivity {
    /// File path.
    pub path: String,
    /// Latest turn that touched the file.
    pub last_modified_turn: usize,
    /// Tools used on the file, first use first.
    pub operations: Vec<String>,
    /// Modifying tool uses.
    pub edit_count: usize,
}

/// Assistant text mentioning unfinished work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncompleteTask {
    /// The text block.
    pub title: String,
    /// Turn it appeared in.
    pub mentioned_in_turn: usize,
}

fn assistant_messages(entries: &[SessionEntry]) -> impl DoubleEndedIterator<Item = (&SessionEntry, &Message)> {
    entries
        .iter()
        .filter_map(|e| e.message.as_ref().filter(|m| m.role == "assistant").map(|m| (e, m)))
}

/// Files touched by Read/Edit/Write/NotebookEdit.
///
/// Every message entry is scanned once per snapshot entry, so counts grow
/// with the number of snapshots and a session without snapshots lists no
/// files.
fn extract_recent_files(entries: &[SessionEntry], turn_index: &TurnIndex) -> Vec<FileActivity> {
    let snapshots = entries.iter().filter(|e| e.entry_type == ENTRY_TYPE_FILE_SNAPSHOT).count();
    let mut files: IndexMap<&str, FileActivity> = IndexMap::new();

    for _ in 0..snapshots {
        for entry in entries {
            let Some(message) = &entry.message else {
                continue;
            };
            for tool in message.tool_uses() {
                let Some(action) = FileAction::from_tool_name(&tool.name) else {
                    continue;
                };
                let Some(path) = tool.input_str("file_path").filter(|p| !p.is_empty()) else {
                    continue;
                };
                let activity = files.entry(path).or_insert_with(|| FileActivity {
                    path: path.to_string(),
                    ..FileActivity::default()
                });
                let turn = turn_index.get(&entry.uuid).unwrap_or_default();
                activity.last_modified_turn = activity.last_modified_turn.max(turn);
                if !activity.operations.contains(&tool.name) {
                    activity.operations.push(tool.name.clone());
                }
                if action.is_modification() {
                    activity.edit_count += 1;
                }
            }
        }
    }

    let mut recent: Vec<FileActivity> = files.into_values().collect();
    recent.sort_by(|a, b| {
        b.last_modified_turn
            .cmp(&a.last_modified_turn)
            .then_with(|| a.path.cmp(&b.path))
    });
    recent.truncate(RECENT_FILES_LIMIT);
    recent
}

fn extract_incomplete_tasks(entries: &[SessionEntry], turn_index: &TurnIndex) -> Vec<IncompleteTask> {
    assistant_messages(entries)
        .flat_map(|(entry, message)| {
            let turn = turn_index.get(&entry.uuid).unwrap_or_default();
            message
                .texts()
                .filter(|t| {
                    let lower = t.to_lowercase();
                    lower.contains("incomplete") || lower.contains("todo")
                })
                .map(move |t| IncompleteTask {
                    title: t.to_string(),
                    mentioned_in_turn: turn,
                })
        })
        .collect()
}

/// Message entries after the last one carrying an `is_error` tool result.
fn count_error_free_turns(entries: &[SessionEntry]) -> usize {
    entries
        .iter()
        .rev()
        .filter(|e| e.is_message())
        .filter_map(|e| e.message.as_ref())
        .take_while(|m| !m.tool_results().any(|r| r.is_error))
        .count()
}

fn determine_current_focus(entries: &[SessionEntry]) -> String {
    assistant_messages(entries)
        .rev()
        .find_map(|(_, m)| m.texts().find(|t| !t.trim().is_empty()))
        .unwrap_or_default()
        .to_string()
}

fn extract_recent_achievements(entries: &[SessionEntry]) -> Vec<String> {
    assistant_messages(entries)
        .rev()
        .flat_map(|(_, m)| m.texts())
        .filter(|t| {
            let lower = t.to_lowercase();
            lower.contains("completed") || lower.contains("implemented")
        })
        .take(RECENT_ACHIEVEMENTS_LIMIT)
        .map(str::to_string)
        .collect()
}

/// Summarize the session: recent files, open tasks, error-free streak,
/// current focus and recent achievements.
#[instrument(skip(entries), fields(entries = entries.len()))]
pub fn build_project_state(entries: &[SessionEntry], opts: ProjectStateOptions) -> ProjectState {
    let turn_index = TurnIndex::build(entries);

    let state = ProjectState {
        session_id: entries.first().map(|e| e.session_id.clone()).unwrap_or_default(),
        recent_files: extract_recent_files(entries, &turn_index),
        incomplete_stages: if opts.include_incomplete {
            extract_incomplete_tasks(entries, &turn_index)
        } else {
            Vec::new()
        },
        last_error_free_turns: count_error_free_turns(entries),
        current_focus: determine_current_focus(entries),
        recent_achievements: extract_recent_achievements(entries),
    };

    debug!(
        files = state.recent_files.len(),
        error_free = state.last_error_free_turns,
        "Built project state"
    );
    state
}
