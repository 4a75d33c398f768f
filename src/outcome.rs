//! The uniform execution outcome and its generic data payload.
//!
//! The payload is a closed set resolved by the execute type: reader
//! executions produce an ordered row sequence, non-query and scalar
//! executions produce the single-field `{"AffectedRows": N}` wrapper.
//! Consumers pattern-match instead of probing a dynamic value.

use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::results::ResultSet;
use crate::types::RowValues;

/// Generic data payload of a [`QueryOutcome`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultData {
    /// Ordered sequence of row objects, one map per fetched row.
    Rows(Vec<JsonMap<String, JsonValue>>),
    /// Count wrapper used by non-query executions. Scalar executions reuse
    /// the same field name for the coerced scalar value; that is the wire
    /// contract callers already depend on.
    AffectedRows {
        #[serde(rename = "AffectedRows")]
        affected_rows: i64,
    },
}

impl ResultData {
    /// Count payload for non-query and scalar executions.
    #[must_use]
    pub fn affected(affected_rows: i64) -> Self {
        ResultData::AffectedRows { affected_rows }
    }

    /// Row-sequence payload built from a materialized result set.
    #[must_use]
    pub fn from_result_set(result_set: &ResultSet) -> Self {
        let rows = result_set
            .results
            .iter()
            .map(|row| {
                row.column_names
                    .iter()
                    .zip(row.values.iter())
                    .map(|(name, value)| (name.clone(), row_value_to_json(value)))
                    .collect::<JsonMap<_, _>>()
            })
            .collect();
        ResultData::Rows(rows)
    }

    /// Serialize the payload to its wire shape.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

/// Uniform result of one query execution.
///
/// Constructed exactly once per invocation, either on the success path or
/// in exactly one of the failure branches, and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryOutcome {
    /// Whether the operation completed without errors.
    pub success: bool,
    /// Records affected; `-1` when the operation kind has no meaningful
    /// count (reads), `0` on failure.
    pub records_affected: i64,
    /// Populated only on failure when failures are not thrown.
    pub error_message: Option<String>,
    /// Generic payload, `None` on failure.
    pub data: Option<ResultData>,
}

impl QueryOutcome {
    pub(crate) fn succeeded(records_affected: i64, data: ResultData) -> Self {
        Self {
            success: true,
            records_affected,
            error_message: None,
            data: Some(data),
        }
    }

    pub(crate) fn failed(error_message: String) -> Self {
        Self {
            success: false,
            records_affected: 0,
            error_message: Some(error_message),
            data: None,
        }
    }
}

fn row_value_to_json(value: &RowValues) -> JsonValue {
    match value {
        RowValues::Int(i) => JsonValue::from(*i),
        RowValues::Float(f) => JsonValue::from(*f),
        RowValues::Text(s) => JsonValue::String(s.clone()),
        RowValues::Bool(b) => JsonValue::Bool(*b),
        RowValues::Timestamp(dt) => {
            JsonValue::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }
        RowValues::Null => JsonValue::Null,
        RowValues::JSON(v) => v.clone(),
        RowValues::Blob(bytes) => JsonValue::from(bytes.clone()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;

    #[test]
    fn affected_rows_payload_uses_the_wire_key() {
        let data = ResultData::affected(3);
        assert_eq!(data.to_json(), json!({ "AffectedRows": 3 }));
    }

    #[test]
    fn rows_payload_is_an_ordered_array_of_objects() {
        let mut result_set = ResultSet::with_capacity(2);
        result_set.set_column_names(Arc::new(vec!["ID".to_string(), "NAME".to_string()]));
        result_set.add_row_values(vec![RowValues::Int(1), RowValues::Text("a".into())]);
        result_set.add_row_values(vec![RowValues::Int(2), RowValues::Null]);

        let data = ResultData::from_result_set(&result_set);
        assert_eq!(
            data.to_json(),
            json!([
                { "ID": 1, "NAME": "a" },
                { "ID": 2, "NAME": null },
            ])
        );
    }

    #[test]
    fn outcome_serializes_with_platform_field_names() {
        let outcome = QueryOutcome::succeeded(3, ResultData::affected(3));
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            value,
            json!({
                "Success": true,
                "RecordsAffected": 3,
                "ErrorMessage": null,
                "Data": { "AffectedRows": 3 },
            })
        );
    }
}
