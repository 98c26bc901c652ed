//! Filter stage of the unified query.

use regex::Regex;
use tracing::{debug, instrument};

use super::params::FilterSpec;
use super::resources::{QueryResource, Resources};

/// Match `value` against `pattern` as a regex, or by equality when the
/// pattern does not compile.
#[must_use]
pub fn matches_pattern(value: &str, pattern: &str) -> bool {
    match Regex::new(pattern) {
        Ok(re) => re.is_match(value),
        Err(_) => value == pattern,
    }
}

/// Pre-compiled form of a [`FilterSpec`].
struct Matcher<'a> {
    spec: &'a FilterSpec,
    content: Option<Pattern>,
    tool_name: Option<Pattern>,
}

enum Pattern {
    Regex(Regex),
    Literal(String),
}

impl Pattern {
    fn new(pattern: &str) -> Option<Self> {
        if pattern.is_empty() {
            return None;
        }
        Some(match Regex::new(pattern) {
            Ok(re) => Self::Regex(re),
            Err(_) => Self::Literal(pattern.to_string()),
        })
    }

    fn is_match(&self, value: &str) -> bool {
        match self {
            Self::Regex(re) => re.is_match(value),
            Self::Literal(literal) => value == literal,
        }
    }
}

fn exact(condition: &str, value: Option<&str>) -> bool {
    condition.is_empty() || value.map_or(true, |v| v == condition)
}

impl<'a> Matcher<'a> {
    fn new(spec: &'a FilterSpec) -> Self {
        Self {
            spec,
            content: Pattern::new(&spec.content_match),
            tool_name: Pattern::new(&spec.tool_name),
        }
    }

    fn matches<R: QueryResource>(&self, item: &R) -> bool {
        let spec = self.spec;

        if !exact(&spec.entry_type, item.entry_type()) {
            return false;
        }
        if !spec.uuid.is_empty() && item.uuid() != spec.uuid {
            return false;
        }
        // Session, parent and branch compare as empty on tool calls.
        if !spec.session_id.is_empty() && item.session_id().unwrap_or_default() != spec.session_id {
            return false;
        }
        if !spec.parent_uuid.is_empty() && item.parent_uuid().unwrap_or_default() != spec.parent_uuid {
            return false;
        }
        if !spec.git_branch.is_empty() && item.git_branch().unwrap_or_default() != spec.git_branch {
            return false;
        }
        if let Some(range) = &spec.time_range {
            if !range.contains(item.timestamp()) {
                return false;
            }
        }
        if !exact(&spec.role, item.role()) {
            return false;
        }
        if !spec.content_type.is_empty()
            && item.as_tool_call().is_none()
            && !item.content_blocks().iter().any(|b| b.type_name() == spec.content_type)
        {
            return false;
        }
        if let Some(pattern) = &self.content {
            if !pattern.is_match(&item.text_content()) {
                return false;
            }
        }

        if let Some(call) = item.as_tool_call() {
            if let Some(pattern) = &self.tool_name {
                if !pattern.is_match(&call.tool_name) {
                    return false;
                }
            }
            if !spec.tool_status.is_empty() && call.status != spec.tool_status {
                return false;
            }
            if let Some(has_error) = spec.has_error {
                if call.error.is_empty() == has_error {
                    return false;
                }
            }
        }
        true
    }
}

/// Keep the items of a single resource kind that satisfy every applicable
/// condition, in their original order.
pub fn filter_items<R: QueryResource>(items: Vec<R>, spec: &FilterSpec) -> Vec<R> {
    if spec.is_empty() {
        return items;
    }
    let matcher = Matcher::new(spec);
    items.into_iter().filter(|item| matcher.matches(item)).collect()
}

/// Apply a filter to any resource view. An empty filter is the identity.
#[instrument(skip_all, fields(kind = resources.kind(), items = resources.len()))]
pub fn apply_filter(resources: Resources, spec: &FilterSpec) -> Resources {
    if spec.is_empty() {
        return resources;
    }
    let filtered = match resources {
        Resources::Entries(items) => Resources::Entries(filter_items(items, spec)),
        Resources::Messages(items) => Resources::Messages(filter_items(items, spec)),
        Resources::Tools(items) => Resources::Tools(filter_items(items, spec)),
    };
    debug!(kept = filtered.len(), "Applied filter");
    filtered
}
