//! Path expressions addressing into the request tree
//!
//! A path is a dot-separated sequence of segments. A segment may carry a
//! selector in square brackets: a numeric selector addresses the Nth element
//! of a list at that position (creating it if absent), any other selector
//! addresses a map entry by key.
//!
//! Examples: `ImageId`, `IamInstanceProfile.Name`, `Listeners[0].Port`,
//! `Attributes[DelaySeconds]`.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::EngineError;

/// How a segment addresses into its container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Plain struct member
    None,
    /// Nth element of a list, extended with null elements as needed
    Index(usize),
    /// Map entry by key
    Key(String),
}

/// One parsed segment of a path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub selector: Selector,
}

fn segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)(?:\[([^\[\]]+)\])?$").unwrap())
}

/// Parse a path expression into segments.
///
/// Deterministic; the same input always yields the same segments.
pub fn parse_path(path: &str) -> Result<Vec<Segment>, EngineError> {
    if path.is_empty() {
        return Err(invalid(path, "empty path"));
    }

    let mut segments = Vec::new();
    for raw in path.split('.') {
        let caps = segment_re()
            .captures(raw)
            .ok_or_else(|| invalid(path, format!("malformed segment '{}'", raw)))?;

        let name = caps[1].to_string();
        let selector = match caps.get(2) {
            None => Selector::None,
            Some(sel) => match sel.as_str().parse::<usize>() {
                Ok(idx) => Selector::Index(idx),
                Err(_) => Selector::Key(sel.as_str().to_string()),
            },
        };
        segments.push(Segment { name, selector });
    }
    Ok(segments)
}

fn invalid(path: &str, reason: impl Into<String>) -> EngineError {
    EngineError::InvalidPath {
        path: path.to_string(),
        reason: reason.into(),
    }
}
