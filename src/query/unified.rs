//! The unified query pipeline: validate, select, filter, transform, aggregate.

use tracing::{debug, instrument, trace};

use super::aggregate::{apply_aggregate, QueryResult};
use super::filter::apply_filter;
use super::params::{apply_defaults, validate_query_params, QueryParams, TransformSpec};
use super::resources::{select_resource, Resources};
use crate::error::Result;
use crate::model::SessionEntry;

/// Transformation stage. Reserved: resources pass through unchanged.
#[must_use]
pub fn apply_transform(resources: Resources, spec: &TransformSpec) -> Resources {
    if !spec.is_empty() {
        trace!(?spec, "Transform stage is a pass-through");
    }
    resources
}

/// Run a unified query over a session.
///
/// Output formatting, `output.limit` and `jq_filter` are left to the caller.
#[instrument(skip_all, fields(entries = entries.len(), resource = %params.resource))]
pub fn query(entries: &[SessionEntry], params: QueryParams) -> Result<QueryResult> {
    let params = apply_defaults(params);
    validate_query_params(&params)?;

    let resources = select_resource(entries, &params.resource)?;
    let filtered = apply_filter(resources, &params.filter);
    let transformed = apply_transform(filtered, &params.transform);
    let result = apply_aggregate(transformed, &params.aggregate);

    debug!(results = result.len(), "Query complete");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetaError;
    use crate::parser::JsonlParser;
    use crate::query::params::{AggregateSpec, FilterSpec};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const SESSION: &str = r#"{"type":"user","uuid":"u1","timestamp":"2025-10-02T10:00:00Z","message":{"role":"user","content":"run it"}}
{"type":"assistant","uuid":"a1","timestamp":"2025-10-02T10:00:01Z","message":{"role":"assistant","content":[{"type":"tool_use","id":"t1","name":"Bash","input":{}},{"type":"tool_use","id":"t2","name":"Read","input":{}}]}}
{"type":"user","uuid":"u2","timestamp":"2025-10-02T10:00:02Z","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"t1","content":"nope","is_error":true},{"type":"tool_result","tool_use_id":"t2","content":"ok"}]}}
{"type":"assistant","uuid":"a2","timestamp":"2025-10-02T10:00:03Z","message":{"role":"assistant","content":[{"type":"tool_use","id":"t3","name":"Bash","input":{}}]}}
{"type":"user","uuid":"u3","timestamp":"2025-10-02T10:00:04Z","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"t3","content":"again","is_error":true}]}}"#;

    fn entries() -> Vec<SessionEntry> {
        JsonlParser::new().parse_str(SESSION).unwrap()
    }

    #[test]
    fn test_default_query_returns_entries() {
        let result = query(&entries(), QueryParams::default()).unwrap();
        assert!(matches!(&result, QueryResult::Resources(Resources::Entries(e)) if e.len() == 5));
    }

    #[test]
    fn test_tools_errors_counted_by_name() {
        let params = QueryParams {
            resource: "tools".into(),
            filter: FilterSpec {
                tool_status: "error".into(),
                ..FilterSpec::default()
            },
            aggregate: AggregateSpec {
                function: "count".into(),
                field: "tool_name".into(),
            },
            ..QueryParams::default()
        };
        let result = query(&entries(), params).unwrap();
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!([{"tool_name": "Bash", "count": 2}])
        );
    }

    #[test]
    fn test_messages_grouped_by_role() {
        let params = QueryParams {
            resource: "messages".into(),
            aggregate: AggregateSpec {
                function: "count".into(),
                field: "role".into(),
            },
            ..QueryParams::default()
        };
        let json = serde_json::to_value(query(&entries(), params).unwrap()).unwrap();
        assert_eq!(json, json!([{"role": "user", "count": 3}, {"role": "assistant", "count": 2}]));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = QueryParams {
            scope: "galaxy".into(),
            ..QueryParams::default()
        };
        let err = query(&entries(), params).unwrap_err();
        assert!(matches!(err, MetaError::InvalidQuery(ref v) if v.field == "scope"));
        assert!(err.to_string().starts_with("invalid query parameters: invalid scope"));
    }

    #[test]
    fn test_transform_is_passthrough() {
        let resources = Resources::Entries(entries());
        let spec = TransformSpec {
            group_by: "type".into(),
            ..TransformSpec::default()
        };
        assert_eq!(apply_transform(resources.clone(), &spec), resources);
    }
}
