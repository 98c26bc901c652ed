//! Data model for Claude Code JSONL logs.
//!
//! Session entries and their content blocks are parsed as-is from the
//! transcript. [`ToolCall`] is derived: it joins a `tool_use` block with the
//! `tool_result` that answers it.

pub mod content;
pub mod entry;
pub mod tool_call;
pub mod tools;

pub use content::*;
pub use entry::*;
pub use tool_call::*;
pub use tools::*;

use serde::{Deserialize, Deserializer};

/// Deserialize a field, mapping JSON `null` to the type's default.
///
/// Transcripts write `"parentUuid": null` for root entries and omit or null
/// other fields freely; the model treats all of these as empty.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
