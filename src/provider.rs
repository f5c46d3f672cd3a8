//! Provider transport boundary
//!
//! The engine never speaks a wire protocol itself: all remote effects go
//! through a caller-supplied `Provider`. Calls are synchronous; transport
//! timeouts and sessions are the provider's concern. The engine performs no
//! retries; a single remote error surfaces immediately.

use serde_json::Value;
use thiserror::Error;

/// One outgoing control-plane call.
#[derive(Debug, Clone)]
pub struct ProviderCall<'a> {
    /// Provider API the operation belongs to, e.g. `compute`
    pub api: &'a str,
    /// Operation name within that API, e.g. `RunInstances`
    pub operation: &'a str,
    /// The built request tree
    pub payload: &'a Value,
    /// Simulate marker: the provider must validate without side effects
    pub dry_run: bool,
}

/// Transport for control-plane calls.
pub trait Provider: Send + Sync {
    fn call(&self, call: &ProviderCall<'_>) -> Result<Value, ProviderError>;
}

/// A remote rejection, carrying the provider's machine-readable code.
///
/// The dry-run simulator classifies these codes; everything else treats the
/// error as opaque.
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
