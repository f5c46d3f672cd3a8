//! The generic request tree and path-addressed writes into it
//!
//! Provider requests are modeled as a tagged-variant tree (scalar, list,
//! struct) using `serde_json::Value`. The builder walks a parsed path and
//! creates intermediate structures as addressed; a concrete provider binding
//! converts the finished tree into its own typed request as a final,
//! explicit step.
//!
//! Writes are deterministic and idempotent: writing the same value at the
//! same path twice yields a structurally equal tree.

use serde_json::Value;

use crate::error::EngineError;
use crate::path::{Segment, Selector};

/// Write `value` at `path`, creating intermediate structs and extending
/// lists with null elements as needed.
///
/// Fails with `InvalidPath` when a segment addresses an incompatible
/// existing shape, e.g. indexing into a non-list.
pub fn set_at_path(root: &mut Value, path: &[Segment], value: Value) -> Result<(), EngineError> {
    let (last, init) = path
        .split_last()
        .ok_or_else(|| invalid(path, "empty path"))?;

    let mut node = root;
    for seg in init {
        node = descend(node, seg, path)?;
    }

    let map = as_struct(node, path)?;
    match &last.selector {
        Selector::None => {
            map.insert(last.name.clone(), value);
        }
        Selector::Index(idx) => {
            let list = list_entry(map, &last.name, path)?;
            pad_to(list, *idx);
            list[*idx] = value;
        }
        Selector::Key(key) => {
            let entry = map
                .entry(last.name.clone())
                .or_insert_with(|| Value::Object(Default::default()));
            let inner = as_struct(entry, path)?;
            inner.insert(key.clone(), value);
        }
    }
    Ok(())
}

/// Read the value at `path`, if present. Used to read request fields back
/// for encode/decode consistency checks.
pub fn get_at_path<'a>(root: &'a Value, path: &[Segment]) -> Option<&'a Value> {
    let mut node = root;
    for seg in path {
        node = node.as_object()?.get(&seg.name)?;
        match &seg.selector {
            Selector::None => {}
            Selector::Index(idx) => node = node.as_array()?.get(*idx)?,
            Selector::Key(key) => node = node.as_object()?.get(key)?,
        }
    }
    Some(node)
}

/// Descend one segment, creating the addressed struct or list element.
fn descend<'a>(
    node: &'a mut Value,
    seg: &Segment,
    path: &[Segment],
) -> Result<&'a mut Value, EngineError> {
    let map = as_struct(node, path)?;
    match &seg.selector {
        Selector::None => Ok(map
            .entry(seg.name.clone())
            .or_insert_with(|| Value::Object(Default::default()))),
        Selector::Index(idx) => {
            let list = list_entry(map, &seg.name, path)?;
            pad_to(list, *idx);
            if list[*idx].is_null() {
                list[*idx] = Value::Object(Default::default());
            }
            Ok(&mut list[*idx])
        }
        Selector::Key(key) => {
            let entry = map
                .entry(seg.name.clone())
                .or_insert_with(|| Value::Object(Default::default()));
            let inner = as_struct(entry, path)?;
            Ok(inner
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Default::default())))
        }
    }
}

fn as_struct<'a>(
    node: &'a mut Value,
    path: &[Segment],
) -> Result<&'a mut serde_json::Map<String, Value>, EngineError> {
    if node.is_null() {
        *node = Value::Object(Default::default());
    }
    match node {
        Value::Object(map) => Ok(map),
        other => Err(invalid(
            path,
            format!("expected struct, found {}", kind(other)),
        )),
    }
}

fn list_entry<'a>(
    map: &'a mut serde_json::Map<String, Value>,
    name: &str,
    path: &[Segment],
) -> Result<&'a mut Vec<Value>, EngineError> {
    let entry = map
        .entry(name.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    match entry {
        Value::Array(list) => Ok(list),
        other => Err(invalid(
            path,
            format!("'{}' is not a list, found {}", name, kind(other)),
        )),
    }
}

/// Extend with nulls so index `idx` exists; earlier elements stay at their
/// zero value.
fn pad_to(list: &mut Vec<Value>, idx: usize) {
    while list.len() <= idx {
        list.push(Value::Null);
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "struct",
    }
}

fn invalid(path: &[Segment], reason: impl Into<String>) -> EngineError {
    let rendered = path
        .iter()
        .map(|s| match &s.selector {
            Selector::None => s.name.clone(),
            Selector::Index(i) => format!("{}[{}]", s.name, i),
            Selector::Key(k) => format!("{}[{}]", s.name, k),
        })
        .collect::<Vec<_>>()
        .join(".");
    EngineError::InvalidPath {
        path: rendered,
        reason: reason.into(),
    }
}
