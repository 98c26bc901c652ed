//! Unified query parameters.
//!
//! Parameters are plain strings so a JSON document from any caller can be
//! deserialized as-is; [`validate_query_params`] rejects values outside the
//! accepted sets before the pipeline runs.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Resource names accepted by `resource`.
pub const VALID_RESOURCES: &[&str] = &["entries", "messages", "tools"];

/// Scope names accepted by `scope`.
pub const VALID_SCOPES: &[&str] = &["session", "project"];

/// Function names accepted by `aggregate.function`.
///
/// Only `count` and `group` are computed. `sum`, `avg`, `min` and `max` pass
/// validation and then return the filtered resources unchanged.
pub const VALID_AGGREGATE_FUNCTIONS: &[&str] = &["count", "sum", "avg", "min", "max", "group"];

/// Format names accepted by `output.format`.
pub const VALID_OUTPUT_FORMATS: &[&str] = &["jsonl", "tsv", "summary"];

/// Default resource.
pub const DEFAULT_RESOURCE: &str = "entries";
/// Default scope.
pub const DEFAULT_SCOPE: &str = "project";
/// Default output format.
pub const DEFAULT_OUTPUT_FORMAT: &str = "jsonl";

/// Parameters of a unified query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    /// `entries`, `messages` or `tools`.
    pub resource: String,
    /// `session` or `project`.
    pub scope: String,
    /// Conditions every returned item satisfies.
    pub filter: FilterSpec,
    /// Reserved; carried but not applied.
    pub transform: TransformSpec,
    /// Optional count or group-by.
    pub aggregate: AggregateSpec,
    /// Presentation hints for the caller.
    pub output: OutputSpec,
    /// Reserved; carried but not applied.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub jq_filter: String,
}

/// Filter conditions, combined with AND.
///
/// A condition that does not apply to the selected resource is skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    /// Entry type (entries only).
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub entry_type: String,
    /// Session ID.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub session_id: String,
    /// Entry UUID.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    /// Parent entry UUID.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub parent_uuid: String,
    /// Git branch.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub git_branch: String,
    /// Inclusive timestamp range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    /// Message role.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub role: String,
    /// Content block type the item must contain.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content_type: String,
    /// Pattern matched against text content.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content_match: String,
    /// Pattern matched against tool name (tools only).
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tool_name: String,
    /// Exact tool status (tools only).
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tool_status: String,
    /// Whether the tool call carries error text (tools only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_error: Option<bool>,
}

impl FilterSpec {
    /// Whether no condition is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Inclusive range of ISO 8601 timestamps; an empty bound is open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeRange {
    /// Lower bound.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub start: String,
    /// Upper bound.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub end: String,
}

impl TimeRange {
    /// Lexicographic containment check; ISO 8601 strings sort by time.
    #[must_use]
    pub fn contains(&self, timestamp: &str) -> bool {
        (self.start.is_empty() || timestamp >= self.start.as_str())
            && (self.end.is_empty() || timestamp <= self.end.as_str())
    }
}

/// Reserved transformation stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSpec {
    /// Field paths to extract.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extract: Vec<String>,
    /// Field to group by.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub group_by: String,
    /// Join with related entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join: Option<JoinSpec>,
}

impl TransformSpec {
    /// Whether no transformation is requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Join with entries of another type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinSpec {
    /// Entry type to join with.
    #[serde(rename = "type")]
    pub join_type: String,
    /// Field to join on.
    pub on: String,
}

/// Aggregation stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateSpec {
    /// Function name; empty disables aggregation.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub function: String,
    /// Field to group by.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub field: String,
}

impl AggregateSpec {
    /// Whether no aggregation is requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.function.is_empty()
    }
}

/// Presentation hints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSpec {
    /// `jsonl`, `tsv` or `summary`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub format: String,
    /// Maximum number of results (0 = no limit).
    #[serde(skip_serializing_if = "is_zero")]
    pub limit: usize,
    /// Field to sort by.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sort_by: String,
    /// `asc` or `desc`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sort_order: String,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

/// Fill an empty resource, scope and output format with their defaults.
///
/// Idempotent.
#[must_use]
pub fn apply_defaults(mut params: QueryParams) -> QueryParams {
    if params.resource.is_empty() {
        params.resource = DEFAULT_RESOURCE.to_string();
    }
    if params.scope.is_empty() {
        params.scope = DEFAULT_SCOPE.to_string();
    }
    if params.output.format.is_empty() {
        params.output.format = DEFAULT_OUTPUT_FORMAT.to_string();
    }
    params
}

/// Check resource, scope, aggregate function and output format after
/// defaults are applied.
pub fn validate_query_params(params: &QueryParams) -> Result<(), ValidationError> {
    let params = apply_defaults(params.clone());

    check("resource", &params.resource, VALID_RESOURCES)?;
    check("scope", &params.scope, VALID_SCOPES)?;
    if !params.aggregate.is_empty() {
        check("aggregate.function", &params.aggregate.function, VALID_AGGREGATE_FUNCTIONS)?;
    }
    check("output.format", &params.output.format, VALID_OUTPUT_FORMATS)
}

fn check(field: &str, value: &str, valid: &[&str]) -> Result<(), ValidationError> {
    if valid.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new(field, value, valid))
    }
}
