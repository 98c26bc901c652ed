//! Tool-call metrics grouped by tool, status or issuing entry.

use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{MetaError, Result, ValidationError};
use crate::model::{ToolCall, STATUS_ERROR};

/// Field tool calls are grouped by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupBy {
    /// Tool name.
    #[default]
    Tool,
    /// Result status; unanswered and successful calls share the empty status.
    Status,
    /// UUID of the issuing entry.
    Uuid,
}

impl GroupBy {
    const VALID: &'static [&'static str] = &["tool", "status", "uuid"];

    fn key(self, call: &ToolCall) -> &str {
        match self {
            Self::Tool => &call.tool_name,
            Self::Status => &call.status,
            Self::Uuid => &call.uuid,
        }
    }
}

impl FromStr for GroupBy {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "tool" => Ok(Self::Tool),
            "status" => Ok(Self::Status),
            "uuid" => Ok(Self::Uuid),
            _ => Err(ValidationError::new("group_by", s, Self::VALID)),
        }
    }
}

/// Value computed for each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateMetric {
    /// Calls in the group.
    Count,
    /// Fraction of calls in the group with status `error`.
    ErrorRate,
}

impl AggregateMetric {
    const VALID: &'static [&'static str] = &["count", "error_rate"];

    /// Key of the metric in [`GroupStats::metrics`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::ErrorRate => "error_rate",
        }
    }

    fn compute(self, calls: &[&ToolCall]) -> Value {
        match self {
            Self::Count => Value::from(calls.len()),
            Self::ErrorRate => {
                if calls.is_empty() {
                    return Value::from(0.0);
                }
                let errors = calls.iter().filter(|c| c.status == STATUS_ERROR).count();
                Value::from(errors as f64 / calls.len() as f64)
            }
        }
    }
}

impl FromStr for AggregateMetric {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "count" => Ok(Self::Count),
            "error_rate" => Ok(Self::ErrorRate),
            _ => Err(ValidationError::new("metric", s, Self::VALID)),
        }
    }
}

/// Metrics of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    /// Shared value of the grouping field.
    pub group_value: String,
    /// Metric name to value, in requested order.
    pub metrics: IndexMap<String, Value>,
}

/// Group `calls` by `group_by` and compute `metrics` for each group.
///
/// Largest groups come first; equal sizes keep first-seen order.
#[instrument(skip(calls), fields(calls = calls.len()))]
pub fn aggregate_tool_calls(
    calls: &[ToolCall],
    group_by: GroupBy,
    metrics: &[AggregateMetric],
) -> Result<Vec<GroupStats>> {
    if metrics.is_empty() {
        return Err(MetaError::invalid_argument("metrics", "at least one metric is required"));
    }

    let mut groups: IndexMap<&str, Vec<&ToolCall>> = IndexMap::new();
    for call in calls {
        groups.entry(group_by.key(call)).or_default().push(call);
    }

    let mut groups: Vec<(&str, Vec<&ToolCall>)> = groups.into_iter().collect();
    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    let stats: Vec<GroupStats> = groups
        .into_iter()
        .map(|(value, members)| GroupStats {
            group_value: value.to_string(),
            metrics: metrics
                .iter()
                .map(|m| (m.name().to_string(), m.compute(&members)))
                .collect(),
        })
        .collect();

    debug!(groups = stats.len(), "Aggregated tool calls");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn call(uuid: &str, tool: &str, status: &str) -> ToolCall {
        ToolCall {
            uuid: uuid.into(),
            tool_name: tool.into(),
            status: status.into(),
            ..ToolCall::default()
        }
    }

    fn calls() -> Vec<ToolCall> {
        vec![
            call("a1", "Read", ""),
            call("a2", "Bash", "error"),
            call("a2", "Edit", ""),
            call("a3", "Bash", ""),
            call("a4", "Bash", "error"),
            call("a5", "Edit", ""),
        ]
    }

    #[test]
    fn test_group_by_tool() {
        let stats = aggregate_tool_calls(&calls(), GroupBy::Tool, &[AggregateMetric::Count, AggregateMetric::ErrorRate])
            .unwrap();
        let value = serde_json::to_value(&stats).unwrap();
        let bash_rate = 2.0 / 3.0;
        assert_eq!(
            value,
            json!([
                {"group_value": "Bash", "metrics": {"count": 3, "error_rate": bash_rate}},
                {"group_value": "Edit", "metrics": {"count": 2, "error_rate": 0.0}},
                {"group_value": "Read", "metrics": {"count": 1, "error_rate": 0.0}},
            ])
        );
    }

    #[test]
    fn test_group_by_status_and_uuid() {
        let by_status = aggregate_tool_calls(&calls(), GroupBy::Status, &[AggregateMetric::Count]).unwrap();
        let keys: Vec<&str> = by_status.iter().map(|s| s.group_value.as_str()).collect();
        assert_eq!(keys, vec!["", "error"]);
        assert_eq!(by_status[0].metrics["count"], json!(4));

        let by_uuid = aggregate_tool_calls(&calls(), GroupBy::Uuid, &[AggregateMetric::ErrorRate]).unwrap();
        assert_eq!(by_uuid[0].group_value, "a2");
        assert_eq!(by_uuid[0].metrics["error_rate"], json!(0.5));
        assert!(!by_uuid[0].metrics.contains_key("count"));
    }

    #[test]
    fn test_empty_input_and_metrics() {
        assert!(aggregate_tool_calls(&[], GroupBy::Tool, &[AggregateMetric::Count])
            .unwrap()
            .is_empty());

        let err = aggregate_tool_calls(&calls(), GroupBy::Tool, &[]).unwrap_err();
        assert!(matches!(err, MetaError::InvalidArgument { ref name, .. } if name == "metrics"));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("uuid".parse::<GroupBy>().unwrap(), GroupBy::Uuid);
        assert_eq!(" error_rate".parse::<AggregateMetric>().unwrap(), AggregateMetric::ErrorRate);

        let err = "session".parse::<GroupBy>().unwrap_err();
        assert_eq!(err.to_string(), "invalid group_by: \"session\", valid values: tool, status, uuid");
        assert!("p95".parse::<AggregateMetric>().is_err());
    }
}
