//! Aggregate stage of the unified query.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{debug, instrument, warn};

use super::params::AggregateSpec;
use super::resources::{QueryResource, Resources};

/// One aggregated row.
///
/// Serializes as `{"count": N}` for a plain count, `{field: value, "count": N}`
/// for a count by field, and adds `"items"` for groups.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    /// Group-by field and its value; `None` for a plain count.
    pub key: Option<(String, String)>,
    /// Number of items in the row.
    pub count: usize,
    /// Member items (`group` only).
    pub items: Option<Resources>,
}

impl Serialize for AggregateRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = 1 + usize::from(self.key.is_some()) + usize::from(self.items.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some((field, value)) = &self.key {
            map.serialize_entry(field, value)?;
        }
        map.serialize_entry("count", &self.count)?;
        if let Some(items) = &self.items {
            map.serialize_entry("items", items)?;
        }
        map.end()
    }
}

/// Output of the aggregate stage.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    /// No aggregation ran; the filtered resources.
    Resources(Resources),
    /// Aggregated rows.
    Rows(Vec<AggregateRow>),
}

impl QueryResult {
    /// Number of top-level items.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Resources(resources) => resources.len(),
            Self::Rows(rows) => rows.len(),
        }
    }

    /// Whether there are no top-level items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn group_by<R: QueryResource + Clone>(items: &[R], field: &str) -> IndexMap<String, Vec<R>> {
    let mut groups: IndexMap<String, Vec<R>> = IndexMap::new();
    for item in items {
        groups
            .entry(item.field_value(field).to_string())
            .or_default()
            .push(item.clone());
    }
    groups
}

fn count_rows<R: QueryResource>(items: &[R], field: &str) -> Vec<AggregateRow> {
    if field.is_empty() {
        return vec![AggregateRow {
            key: None,
            count: items.len(),
            items: None,
        }];
    }
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for item in items {
        *counts.entry(item.field_value(field)).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(value, count)| AggregateRow {
            key: Some((field.to_string(), value.to_string())),
            count,
            items: None,
        })
        .collect()
}

fn group_rows<R: QueryResource + Clone>(
    items: &[R],
    field: &str,
    wrap: impl Fn(Vec<R>) -> Resources,
) -> Vec<AggregateRow> {
    group_by(items, field)
        .into_iter()
        .map(|(value, members)| AggregateRow {
            key: Some((field.to_string(), value)),
            count: members.len(),
            items: Some(wrap(members)),
        })
        .collect()
}

/// Count or group the resources.
///
/// Rows appear in the order their value was first seen. Functions other than
/// `count` and `group` return the resources unchanged, including `sum`,
/// `avg`, `min` and `max`, which query validation accepts.
#[instrument(skip_all, fields(kind = resources.kind(), function = %spec.function))]
pub fn apply_aggregate(resources: Resources, spec: &AggregateSpec) -> QueryResult {
    if spec.is_empty() {
        return QueryResult::Resources(resources);
    }

    let field = spec.field.as_str();
    let rows = match (spec.function.as_str(), &resources) {
        ("count", Resources::Entries(items)) => count_rows(items, field),
        ("count", Resources::Messages(items)) => count_rows(items, field),
        ("count", Resources::Tools(items)) => count_rows(items, field),
        ("group", Resources::Entries(items)) => group_rows(items, field, Resources::Entries),
        ("group", Resources::Messages(items)) => group_rows(items, field, Resources::Messages),
        ("group", Resources::Tools(items)) => group_rows(items, field, Resources::Tools),
        (function, _) => {
            warn!(function, "Aggregate function not implemented; returning resources unchanged");
            return QueryResult::Resources(resources);
        }
    };

    debug!(rows = rows.len(), "Applied aggregate");
    QueryResult::Rows(rows)
}
