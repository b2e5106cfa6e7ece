use std::collections::BTreeMap;

use serde_json::Value;

/// A single claim value from a JWT payload.
///
/// Claims under the `tenants` claim carry arbitrary JSON, so claim values are
/// kept as a tagged type instead of a fixed structure. The permission and
/// role accessors on [`Token`](crate::Token) resolve values through
/// [`string_items`](Self::string_items).
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Str(String),
    List(Vec<ClaimValue>),
    Map(BTreeMap<String, ClaimValue>),
}

impl ClaimValue {
    /// The claim as a list of strings.
    ///
    /// An array claim yields its string elements, a single string yields a
    /// singleton list, any other shape yields an empty list.
    pub fn string_items(&self) -> Vec<String> {
        match self {
            ClaimValue::Str(value) => vec![value.clone()],
            ClaimValue::List(items) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ClaimValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ClaimValue::Number(number) => number.as_i64(),
            _ => None,
        }
    }
}

impl From<Value> for ClaimValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ClaimValue::Null,
            Value::Bool(value) => ClaimValue::Bool(value),
            Value::Number(value) => ClaimValue::Number(value),
            Value::String(value) => ClaimValue::Str(value),
            Value::Array(items) => {
                ClaimValue::List(items.into_iter().map(ClaimValue::from).collect())
            }
            Value::Object(entries) => ClaimValue::Map(
                entries
                    .into_iter()
                    .map(|(name, value)| (name, ClaimValue::from(value)))
                    .collect(),
            ),
        }
    }
}
