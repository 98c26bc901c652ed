//! Turn numbering.
//!
//! A turn is one message entry (user or assistant). Turns are numbered in
//! file order starting at [`FIRST_TURN`]; snapshots and other non-message
//! entries consume no number and are absent from the index. Every positional
//! analysis in the crate (context windows, idle periods, sequence ranges)
//! reads turns from this index.

use std::collections::HashMap;

use crate::model::SessionEntry;

/// Number of the first message entry.
pub const FIRST_TURN: usize = 1;

/// Mapping from entry UUID to turn number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnIndex {
    turns: HashMap<String, usize>,
    base: usize,
    next: usize,
}

impl TurnIndex {
    /// Build the index with turns starting at [`FIRST_TURN`].
    #[must_use]
    pub fn build(entries: &[SessionEntry]) -> Self {
        Self::with_base(entries, FIRST_TURN)
    }

    /// Build the index with turns starting at `base`.
    #[must_use]
    pub fn with_base(entries: &[SessionEntry], base: usize) -> Self {
        let mut turns = HashMap::new();
        let mut turn = base;
        for entry in entries.iter().filter(|e| e.is_message()) {
            turns.insert(entry.uuid.clone(), turn);
            turn += 1;
        }
        Self {
            turns,
            base,
            next: turn,
        }
    }

    /// Turn number of an entry, if it is a message.
    #[must_use]
    pub fn get(&self, uuid: &str) -> Option<usize> {
        self.turns.get(uuid).copied()
    }

    /// Whether the UUID is a numbered message entry.
    #[must_use]
    pub fn contains(&self, uuid: &str) -> bool {
        self.turns.contains_key(uuid)
    }

    /// Number of turns assigned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.next - self.base
    }

    /// Whether no message entry was seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First turn number of this index.
    #[must_use]
    pub const fn base(&self) -> usize {
        self.base
    }

    /// Last assigned turn number, if any.
    #[must_use]
    pub fn last_turn(&self) -> Option<usize> {
        (!self.is_empty()).then(|| self.next - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(entry_type: &str, uuid: &str) -> SessionEntry {
        SessionEntry {
            entry_type: entry_type.to_string(),
            uuid: uuid.to_string(),
            ..SessionEntry::default()
        }
    }

    fn sample() -> Vec<SessionEntry> {
        vec![
            entry("user", "u1"),
            entry("file-history-snapshot", "snap"),
            entry("assistant", "a1"),
            entry("system", "sys"),
            entry("user", "u2"),
        ]
    }

    #[test]
    fn test_skips_non_message_entries() {
        let index = TurnIndex::build(&sample());

        assert_eq!(index.get("u1"), Some(1));
        assert_eq!(index.get("a1"), Some(2));
        assert_eq!(index.get("u2"), Some(3));
        assert_eq!(index.get("snap"), None);
        assert_eq!(index.get("sys"), None);
        assert_eq!(index.len(), 3);
        assert_eq!(index.last_turn(), Some(3));
    }

    #[test]
    fn test_zero_base() {
        let index = TurnIndex::with_base(&sample(), 0);
        assert_eq!(index.get("u1"), Some(0));
        assert_eq!(index.get("u2"), Some(2));
        assert_eq!(index.len(), 3);
        assert_eq!(index.base(), 0);
    }

    #[test]
    fn test_empty() {
        let index = TurnIndex::build(&[]);
        assert!(index.is_empty());
        assert_eq!(index.last_turn(), None);
        assert!(!index.contains("x"));
    }
}
