//! Runtime data values held by the data context.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Data value shared between the data context and bindings.
/// Aggregates are Arc-wrapped so cloning a bound value is O(1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Arc<str>),
    List(Arc<Vec<Value>>),
    Object(Arc<BTreeMap<String, Value>>),
}

impl Value {
    pub fn int(v: i64) -> Self {
        Value::Int(v)
    }

    pub fn bool(v: bool) -> Self {
        Value::Bool(v)
    }

    pub fn string(v: impl Into<String>) -> Self {
        Value::String(v.into().into())
    }

    pub fn object(fields: impl IntoIterator<Item = (impl Into<String>, Value)>) -> Self {
        Value::Object(Arc::new(
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(Arc::new(items.into_iter().collect()))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(v) => Some(v.as_ref()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(v) => Some(v.as_ref()),
            _ => None,
        }
    }

    /// Child value by key: object field or list index.
    pub fn child(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields.get(key),
            Value::List(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Mutable child slot, creating intermediate objects on the way.
    /// Returns `None` when `self` is a scalar or the list index is out of range.
    pub(crate) fn child_mut_or_insert(&mut self, key: &str) -> Option<&mut Value> {
        match self {
            Value::Object(fields) => Some(
                Arc::make_mut(fields)
                    .entry(key.to_string())
                    .or_insert(Value::Null),
            ),
            Value::List(items) => {
                let index = key.parse::<usize>().ok()?;
                Arc::make_mut(items).get_mut(index)
            }
            Value::Null => {
                *self = Value::object(std::iter::empty::<(String, Value)>());
                self.child_mut_or_insert(key)
            }
            _ => None,
        }
    }

    /// String form used when a value names a template.
    ///
    /// Follows the usual script-host coercion: integral floats print without
    /// a fraction, lists join their items with commas, objects collapse to
    /// `[object Object]`.
    pub fn to_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => {
                if *f == 0.0 {
                    "0".to_string()
                } else if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 {
                    format!("{f:.0}")
                } else if f.is_nan() {
                    "NaN".to_string()
                } else if f.is_infinite() {
                    if *f > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
                } else {
                    f.to_string()
                }
            }
            Value::String(s) => s.to_string(),
            Value::List(items) => items
                .iter()
                .map(|item| match item {
                    Value::Null => String::new(),
                    other => other.to_name(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
        }
    }
}

impl Value {
    /// Strict equality as the template host sees it: numbers compare by
    /// value regardless of representation, everything else structurally.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) => {
                self.to_name() == other.to_name()
            }
            _ => self == other,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
