//! Wire types for Lacework API v2 request bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named argument for saved-query execution.
///
/// Serializes as `{"name": ..., "value": ...}`, the shape the
/// query-execution endpoint expects in its `arguments` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryArgument {
    /// Argument name, e.g. `StartTimeRange`.
    pub name: String,
    /// Argument value; always a string on the wire.
    pub value: String,
}

impl QueryArgument {
    /// Creates an argument.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Collects well-formed arguments from caller-supplied JSON.
    ///
    /// Entries that are not objects carrying both `name` and `value` are
    /// dropped silently; lenient shape-checking is the contract here, not
    /// an accident. Non-string scalars are stringified.
    #[must_use]
    pub fn collect_lenient(raw: &[Value]) -> Vec<Self> {
        raw.iter()
            .filter_map(|item| {
                let name = item.get("name")?;
                let value = item.get("value")?;
                Some(Self::new(stringify(name), stringify(value)))
            })
            .collect()
    }

    /// Replaces any argument named `name` with a fresh entry appended at the
    /// end. Last write wins.
    pub fn replace_named(args: &mut Vec<Self>, name: &str, value: impl Into<String>) {
        args.retain(|arg| arg.name != name);
        args.push(Self::new(name, value));
    }
}

/// Renders a JSON scalar the way it should appear as an argument value.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Comparison operator of a [`FieldFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterExpression {
    /// Exact match against `value`.
    Eq,
    /// Membership in `values`.
    In,
}

/// A field comparison for the compliance search `filters` array.
///
/// Serializes as `{"field", "expression", "value"}` for [`FilterExpression::Eq`]
/// or `{"field", "expression", "values"}` for [`FilterExpression::In`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFilter {
    /// Dotted field path, e.g. `account.AccountId`.
    pub field: String,
    /// Comparison operator.
    pub expression: FilterExpression,
    /// Scalar comparand; present exactly for `eq`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// List comparand; present exactly for `in`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

impl FieldFilter {
    /// Builds the filter for a candidate list: a singleton compares with
    /// `eq`, several candidates with `in`, and an empty list filters nothing.
    #[must_use]
    pub fn for_field(field: impl Into<String>, candidates: &[String]) -> Option<Self> {
        match candidates {
            [] => None,
            [only] => Some(Self {
                field: field.into(),
                expression: FilterExpression::Eq,
                value: Some(only.clone()),
                values: None,
            }),
            many => Some(Self {
                field: field.into(),
                expression: FilterExpression::In,
                value: None,
                values: Some(many.to_vec()),
            }),
        }
    }
}
