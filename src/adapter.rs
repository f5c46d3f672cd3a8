//! Type adapter registry
//!
//! A type adapter is a stateless decode/encode pair: `decode` converts a
//! caller-supplied `ParamValue` to the typed value a request field expects,
//! `encode` writes that value into the request tree at the field's path.
//!
//! The catalogue is closed over `AdapterKind`; the registry is a static
//! table, so concurrent reads need no locking. Adding an adapter kind means
//! implementing one decode/encode pair here; injector, builder and
//! orchestrator stay untouched.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};

use crate::error::EngineError;
use crate::params::ParamValue;
use crate::path::Segment;
use crate::request::set_at_path;

/// Identifier of one adapter in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    /// Opaque string; lists join with commas
    Str,
    /// 64-bit integer; numeric strings are parsed
    Int,
    /// Floating point
    Float,
    /// Boolean; "true"/"false" strings are parsed
    Bool,
    /// Ordered list of strings; a bare string becomes a one-element list
    StringList,
    /// List rendered as a single comma-separated string
    CsvStr,
    /// Opaque binary, carried base64-encoded in the request tree
    Blob,
    /// Boolean wrapped as `{"Value": bool}` attribute struct
    BoolAttr,
    /// String wrapped as `{"Value": string}` attribute struct
    StrAttr,
    /// Free-form `key:value` pairs encoded as `[{"Key": .., "Value": ..}]`
    TagList,
    /// Scalar written under a map entry; the path carries the key,
    /// e.g. `Attributes[DelaySeconds]`
    MapEntry,
    /// Scalar written inside an indexed list-of-struct position; the path
    /// carries the index, e.g. `Listeners[0].Port`
    StructList,
}

impl AdapterKind {
    /// All registered adapter kinds.
    pub const ALL: [AdapterKind; 12] = [
        AdapterKind::Str,
        AdapterKind::Int,
        AdapterKind::Float,
        AdapterKind::Bool,
        AdapterKind::StringList,
        AdapterKind::CsvStr,
        AdapterKind::Blob,
        AdapterKind::BoolAttr,
        AdapterKind::StrAttr,
        AdapterKind::TagList,
        AdapterKind::MapEntry,
        AdapterKind::StructList,
    ];

    /// Stable string id, usable from declarative command definitions.
    pub fn id(&self) -> &'static str {
        match self {
            AdapterKind::Str => "str",
            AdapterKind::Int => "int",
            AdapterKind::Float => "float",
            AdapterKind::Bool => "bool",
            AdapterKind::StringList => "string_list",
            AdapterKind::CsvStr => "csv",
            AdapterKind::Blob => "blob",
            AdapterKind::BoolAttr => "bool_attr",
            AdapterKind::StrAttr => "string_attr",
            AdapterKind::TagList => "tag_list",
            AdapterKind::MapEntry => "map_entry",
            AdapterKind::StructList => "struct_list",
        }
    }

    /// Resolve a string id to an adapter kind.
    pub fn from_id(id: &str) -> Result<Self, EngineError> {
        Self::ALL
            .into_iter()
            .find(|k| k.id() == id)
            .ok_or_else(|| EngineError::UnknownAdapter(id.to_string()))
    }
}

/// A bidirectional parameter↔request-field converter.
///
/// Adapters are pure and shared across all command instances.
pub trait TypeAdapter: Send + Sync {
    /// Convert a parameter value to the typed request-field value.
    /// The error string names the expected shape.
    fn decode(&self, value: &ParamValue) -> Result<Value, String>;

    /// Write an already-decoded value into the request tree at `path`.
    fn encode(&self, value: &Value, root: &mut Value, path: &[Segment]) -> Result<(), EngineError> {
        set_at_path(root, path, value.clone())
    }
}

/// Resolve an adapter kind to its converter. Total over `AdapterKind`, so
/// registration-time id checks are the only failure point.
pub fn resolve(kind: AdapterKind) -> &'static dyn TypeAdapter {
    match kind {
        AdapterKind::Str => &StrAdapter,
        AdapterKind::Int => &IntAdapter,
        AdapterKind::Float => &FloatAdapter,
        AdapterKind::Bool => &BoolAdapter,
        AdapterKind::StringList => &StringListAdapter,
        AdapterKind::CsvStr => &CsvStrAdapter,
        AdapterKind::Blob => &BlobAdapter,
        AdapterKind::BoolAttr => &BoolAttrAdapter,
        AdapterKind::StrAttr => &StrAttrAdapter,
        AdapterKind::TagList => &TagListAdapter,
        AdapterKind::MapEntry => &MapEntryAdapter,
        AdapterKind::StructList => &StructListAdapter,
    }
}

struct StrAdapter;

impl TypeAdapter for StrAdapter {
    fn decode(&self, value: &ParamValue) -> Result<Value, String> {
        display_string(value).map(Value::String)
    }
}

struct IntAdapter;

impl TypeAdapter for IntAdapter {
    fn decode(&self, value: &ParamValue) -> Result<Value, String> {
        decode_int(value).map(|i| json!(i))
    }
}

struct FloatAdapter;

impl TypeAdapter for FloatAdapter {
    fn decode(&self, value: &ParamValue) -> Result<Value, String> {
        match value {
            ParamValue::Float(f) => Ok(json!(f)),
            ParamValue::Int(i) => Ok(json!(*i as f64)),
            ParamValue::String(s) => s
                .parse::<f64>()
                .map(|f| json!(f))
                .map_err(|_| format!("invalid float value '{}'", s)),
            other => Err(format!("cannot cast {} to float", other.kind())),
        }
    }
}

struct BoolAdapter;

impl TypeAdapter for BoolAdapter {
    fn decode(&self, value: &ParamValue) -> Result<Value, String> {
        decode_bool(value).map(Value::Bool)
    }
}

struct StringListAdapter;

impl TypeAdapter for StringListAdapter {
    fn decode(&self, value: &ParamValue) -> Result<Value, String> {
        string_list(value).map(|items| json!(items))
    }
}

struct CsvStrAdapter;

impl TypeAdapter for CsvStrAdapter {
    fn decode(&self, value: &ParamValue) -> Result<Value, String> {
        string_list(value).map(|items| Value::String(items.join(",")))
    }
}

struct BlobAdapter;

impl TypeAdapter for BlobAdapter {
    fn decode(&self, value: &ParamValue) -> Result<Value, String> {
        match value {
            ParamValue::Blob(bytes) => Ok(Value::String(BASE64.encode(bytes))),
            ParamValue::String(s) => Ok(Value::String(BASE64.encode(s.as_bytes()))),
            other => Err(format!("cannot cast {} to blob", other.kind())),
        }
    }
}

struct BoolAttrAdapter;

impl TypeAdapter for BoolAttrAdapter {
    fn decode(&self, value: &ParamValue) -> Result<Value, String> {
        decode_bool(value).map(|b| json!({ "Value": b }))
    }
}

struct StrAttrAdapter;

impl TypeAdapter for StrAttrAdapter {
    fn decode(&self, value: &ParamValue) -> Result<Value, String> {
        display_string(value).map(|s| json!({ "Value": s }))
    }
}

struct TagListAdapter;

impl TypeAdapter for TagListAdapter {
    fn decode(&self, value: &ParamValue) -> Result<Value, String> {
        let items = string_list(value)?;
        let mut tags = Vec::with_capacity(items.len());
        for item in &items {
            let (key, val) = item
                .split_once(':')
                .ok_or_else(|| format!("invalid tag '{}', expected 'key:value'", item))?;
            tags.push(json!({ "Key": key, "Value": val }));
        }
        Ok(Value::Array(tags))
    }
}

struct MapEntryAdapter;

impl TypeAdapter for MapEntryAdapter {
    fn decode(&self, value: &ParamValue) -> Result<Value, String> {
        display_string(value).map(Value::String)
    }
}

struct StructListAdapter;

impl TypeAdapter for StructListAdapter {
    fn decode(&self, value: &ParamValue) -> Result<Value, String> {
        Ok(match value {
            ParamValue::Int(i) => json!(i),
            ParamValue::Float(f) => json!(f),
            ParamValue::Bool(b) => json!(b),
            other => Value::String(display_string(other)?),
        })
    }
}

fn display_string(value: &ParamValue) -> Result<String, String> {
    value
        .to_display_string()
        .ok_or_else(|| format!("cannot cast {} to string", value.kind()))
}

fn string_list(value: &ParamValue) -> Result<Vec<String>, String> {
    value
        .as_string_list()
        .ok_or_else(|| format!("cannot cast {} to string list", value.kind()))
}

fn decode_int(value: &ParamValue) -> Result<i64, String> {
    match value {
        ParamValue::Int(i) => Ok(*i),
        ParamValue::String(s) => s
            .parse::<i64>()
            .map_err(|_| format!("invalid integer value '{}'", s)),
        other => Err(format!("cannot cast {} to int", other.kind())),
    }
}

fn decode_bool(value: &ParamValue) -> Result<bool, String> {
    match value {
        ParamValue::Bool(b) => Ok(*b),
        ParamValue::String(s) => s
            .parse::<bool>()
            .map_err(|_| format!("invalid boolean value '{}'", s)),
        other => Err(format!("cannot cast {} to bool", other.kind())),
    }
}
