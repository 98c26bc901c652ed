//! Resource views the unified query runs over.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{MetaError, Result};
use crate::model::{extract_tool_calls, ContentBlock, SessionEntry, ToolCall};

/// A flattened user or assistant message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    /// Entry UUID.
    pub uuid: String,
    /// Session ID.
    pub session_id: String,
    /// Parent entry UUID.
    pub parent_uuid: String,
    /// Entry timestamp.
    pub timestamp: String,
    /// Message role.
    pub role: String,
    /// Non-empty text blocks joined with newlines.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    /// Every content block of the message.
    pub content_blocks: Vec<ContentBlock>,
    /// Git branch.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub git_branch: String,
}

impl MessageView {
    /// Project a user or assistant entry; `None` for anything else.
    #[must_use]
    pub fn from_entry(entry: &SessionEntry) -> Option<Self> {
        let message = entry.message.as_ref().filter(|_| entry.is_message())?;
        Some(Self {
            uuid: entry.uuid.clone(),
            session_id: entry.session_id.clone(),
            parent_uuid: entry.parent_uuid.clone(),
            timestamp: entry.timestamp.clone(),
            role: message.role.clone(),
            content: message.joined_text(),
            content_blocks: message.content.clone(),
            git_branch: entry.git_branch.clone(),
        })
    }
}

/// Field access shared by every resource kind.
///
/// Accessors return `None` where the field does not exist for the kind, so
/// filters can skip conditions that do not apply.
pub trait QueryResource {
    /// Entry or issuing-entry UUID.
    fn uuid(&self) -> &str;
    /// Timestamp.
    fn timestamp(&self) -> &str;
    /// Session ID.
    fn session_id(&self) -> Option<&str>;
    /// Parent UUID.
    fn parent_uuid(&self) -> Option<&str>;
    /// Git branch.
    fn git_branch(&self) -> Option<&str>;
    /// Entry type.
    fn entry_type(&self) -> Option<&str> {
        None
    }
    /// Message role.
    fn role(&self) -> Option<&str> {
        None
    }
    /// Text content used by `content_match`.
    fn text_content(&self) -> String {
        String::new()
    }
    /// Content blocks, for `content_type`.
    fn content_blocks(&self) -> &[ContentBlock] {
        &[]
    }
    /// The tool call, when the resource is one.
    fn as_tool_call(&self) -> Option<&ToolCall> {
        None
    }

    /// Value of a group-by field; unsupported fields read as empty.
    fn field_value(&self, field: &str) -> &str;
}

impl QueryResource for SessionEntry {
    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn timestamp(&self) -> &str {
        &self.timestamp
    }

    fn session_id(&self) -> Option<&str> {
        Some(&self.session_id)
    }

    fn parent_uuid(&self) -> Option<&str> {
        Some(&self.parent_uuid)
    }

    fn git_branch(&self) -> Option<&str> {
        Some(&self.git_branch)
    }

    fn entry_type(&self) -> Option<&str> {
        Some(&self.entry_type)
    }

    fn role(&self) -> Option<&str> {
        SessionEntry::role(self)
    }

    fn text_content(&self) -> String {
        self.concatenated_text()
    }

    fn content_blocks(&self) -> &[ContentBlock] {
        self.content()
    }

    fn field_value(&self, field: &str) -> &str {
        match field {
            "type" => &self.entry_type,
            "session_id" => &self.session_id,
            "git_branch" => &self.git_branch,
            _ => "",
        }
    }
}

impl QueryResource for MessageView {
    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn timestamp(&self) -> &str {
        &self.timestamp
    }

    fn session_id(&self) -> Option<&str> {
        Some(&self.session_id)
    }

    fn parent_uuid(&self) -> Option<&str> {
        Some(&self.parent_uuid)
    }

    fn git_branch(&self) -> Option<&str> {
        Some(&self.git_branch)
    }

    fn role(&self) -> Option<&str> {
        Some(&self.role)
    }

    fn text_content(&self) -> String {
        self.content.clone()
    }

    fn content_blocks(&self) -> &[ContentBlock] {
        &self.content_blocks
    }

    fn field_value(&self, field: &str) -> &str {
        match field {
            "role" => &self.role,
            "session_id" => &self.session_id,
            "git_branch" => &self.git_branch,
            _ => "",
        }
    }
}

impl QueryResource for ToolCall {
    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn timestamp(&self) -> &str {
        &self.timestamp
    }

    fn session_id(&self) -> Option<&str> {
        None
    }

    fn parent_uuid(&self) -> Option<&str> {
        None
    }

    fn git_branch(&self) -> Option<&str> {
        None
    }

    fn as_tool_call(&self) -> Option<&ToolCall> {
        Some(self)
    }

    fn field_value(&self, field: &str) -> &str {
        match field {
            "tool_name" => &self.tool_name,
            "status" => &self.status,
            _ => "",
        }
    }
}

/// One of the three query-able views of a session.
///
/// Serializes as the bare item array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resources {
    /// Raw entries.
    Entries(Vec<SessionEntry>),
    /// User and assistant messages.
    Messages(Vec<MessageView>),
    /// Joined tool calls.
    Tools(Vec<ToolCall>),
}

impl Resources {
    /// Resource name.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Entries(_) => "entries",
            Self::Messages(_) => "messages",
            Self::Tools(_) => "tools",
        }
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Entries(items) => items.len(),
            Self::Messages(items) => items.len(),
            Self::Tools(items) => items.len(),
        }
    }

    /// Whether there are no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep at most `limit` items (0 = no limit).
    #[must_use]
    pub fn truncate(mut self, limit: usize) -> Self {
        if limit > 0 {
            match &mut self {
                Self::Entries(items) => items.truncate(limit),
                Self::Messages(items) => items.truncate(limit),
                Self::Tools(items) => items.truncate(limit),
            }
        }
        self
    }
}

/// Every user or assistant entry that carries a message, as a [`MessageView`].
#[must_use]
pub fn extract_messages(entries: &[SessionEntry]) -> Vec<MessageView> {
    entries.iter().filter_map(MessageView::from_entry).collect()
}

/// Project entries into the named resource view.
#[instrument(skip(entries), fields(entries = entries.len()))]
pub fn select_resource(entries: &[SessionEntry], resource: &str) -> Result<Resources> {
    let selected = match resource {
        "entries" => Resources::Entries(entries.to_vec()),
        "messages" => Resources::Messages(extract_messages(entries)),
        "tools" => Resources::Tools(extract_tool_calls(entries)),
        other => {
            return Err(MetaError::UnknownResource {
                name: other.to_string(),
            })
        }
    };
    debug!(kind = selected.kind(), items = selected.len(), "Selected resource");
    Ok(selected)
}
