//! Caller-supplied parameter values
//!
//! A `ParamDict` is the flat name→value dictionary one invocation is built
//! from. Values stay dynamically typed until the injector routes them
//! through a field's type adapter.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One invocation's parameter dictionary. Created fresh per call, never
/// persisted.
pub type ParamDict = HashMap<String, ParamValue>;

/// A dynamically-typed parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Ordered list of strings
    List(Vec<String>),
    /// Opaque binary
    Blob(Vec<u8>),
}

impl ParamValue {
    /// Human-readable type name, used in mismatch messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::String(_) => "string",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Bool(_) => "bool",
            ParamValue::List(_) => "list",
            ParamValue::Blob(_) => "blob",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Render any scalar as a string; lists join with commas. Blobs have no
    /// string form.
    pub fn to_display_string(&self) -> Option<String> {
        match self {
            ParamValue::String(s) => Some(s.clone()),
            ParamValue::Int(i) => Some(i.to_string()),
            ParamValue::Float(f) => Some(f.to_string()),
            ParamValue::Bool(b) => Some(b.to_string()),
            ParamValue::List(items) => Some(items.join(",")),
            ParamValue::Blob(_) => None,
        }
    }

    /// Coerce to a string list: a bare string becomes a single-element list.
    pub fn as_string_list(&self) -> Option<Vec<String>> {
        match self {
            ParamValue::List(items) => Some(items.clone()),
            ParamValue::String(s) => Some(vec![s.clone()]),
            _ => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::String(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::String(s)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(items: Vec<String>) -> Self {
        ParamValue::List(items)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(items: Vec<&str>) -> Self {
        ParamValue::List(items.into_iter().map(str::to_string).collect())
    }
}

/// Convenience for building a `ParamDict` from pairs.
pub fn params<K, V, I>(pairs: I) -> ParamDict
where
    K: Into<String>,
    V: Into<ParamValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
