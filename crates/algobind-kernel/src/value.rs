//! Call-time argument values.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Canonical named-argument record handed to a function.
pub type NamedArgs = BTreeMap<String, ArgValue>;

/// Key marking a JSON object as a typed value rather than a literal.
pub const TYPE_TAG: &str = "$type";

/// An opaque client object: a value tagged with its client type name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedValue {
    pub type_name: String,
    pub value: Value,
}

impl TypedValue {
    pub fn new(type_name: impl Into<String>, value: Value) -> Self {
        Self {
            type_name: type_name.into(),
            value,
        }
    }
}

/// One argument supplied at call time.
///
/// Only [`ArgValue::Record`] selects the named-record calling convention.
/// A JSON object passed as a [`ArgValue::Literal`] is an opaque value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Literal(Value),
    Record(NamedArgs),
    Typed(TypedValue),
}

impl ArgValue {
    /// Read a JSON value the way the command line spells arguments: objects
    /// carrying a `$type` key become typed values, everything else is a
    /// literal.
    pub fn from_json(value: Value) -> Self {
        if let Value::Object(map) = &value
            && let Some(type_name) = map.get(TYPE_TAG).and_then(Value::as_str)
        {
            let inner = map.get("value").cloned().unwrap_or(Value::Null);
            return ArgValue::Typed(TypedValue::new(type_name, inner));
        }
        ArgValue::Literal(value)
    }

    /// Build a named record from a JSON object. Non-objects yield `None`.
    pub fn record_from_json(value: Value) -> Option<Self> {
        let Value::Object(map) = value else {
            return None;
        };
        let record = map
            .into_iter()
            .map(|(key, value)| (key, ArgValue::from_json(value)))
            .collect();
        Some(ArgValue::Record(record))
    }

    pub fn is_record(&self) -> bool {
        matches!(self, ArgValue::Record(_))
    }
}

impl From<Value> for ArgValue {
    fn from(value: Value) -> Self {
        ArgValue::Literal(value)
    }
}

impl From<TypedValue> for ArgValue {
    fn from(value: TypedValue) -> Self {
        ArgValue::Typed(value)
    }
}

impl From<NamedArgs> for ArgValue {
    fn from(record: NamedArgs) -> Self {
        ArgValue::Record(record)
    }
}
