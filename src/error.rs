//! Error handling for the command engine
//!
//! This module provides idiomatic Rust error types using thiserror for
//! better error messages and proper error chain handling.
//!
//! Parameter and validation problems are accumulated rather than
//! short-circuited, so a caller fixes everything in one pass. Execution
//! errors always carry the command key for traceability and are never
//! retried by the engine.

use thiserror::Error;

/// Main error type surfaced by the engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// All parameter problems detected for one invocation, reported together
    #[error("{}", format_list(.0))]
    Parameters(Vec<ParameterError>),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// All validation problems detected for one invocation, reported together
    #[error("{}", format_list(.0))]
    Validations(Vec<ValidationError>),

    /// A remote call or custom execution routine failed
    #[error("{command}: {source}")]
    Execution {
        command: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("unknown type adapter '{0}'")]
    UnknownAdapter(String),

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("unknown command '{name}'{}", suggestion_help(.suggestion))]
    UnknownCommand {
        name: String,
        suggestion: Option<String>,
    },
}

impl EngineError {
    /// Wrap a lower-level failure as an execution error for `command`.
    pub fn execution(command: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        EngineError::Execution {
            command: command.into(),
            source: source.into(),
        }
    }

    /// Collapse accumulated parameter errors, preserving single-error shape.
    pub fn from_parameter_errors(mut errs: Vec<ParameterError>) -> Self {
        if errs.len() == 1 {
            EngineError::Parameter(errs.remove(0))
        } else {
            EngineError::Parameters(errs)
        }
    }

    /// Collapse accumulated validation errors, preserving single-error shape.
    pub fn from_validation_errors(mut errs: Vec<ValidationError>) -> Self {
        if errs.len() == 1 {
            EngineError::Validation(errs.remove(0))
        } else {
            EngineError::Validations(errs)
        }
    }
}

/// Problems with the caller-supplied parameter dictionary.
///
/// All of these are detected before any remote call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParameterError {
    #[error("missing required param '{0}'")]
    MissingRequired(String),

    #[error("unexpected '{name}' param{}", suggestion_help(.suggestion))]
    Unknown {
        name: String,
        suggestion: Option<String>,
    },

    #[error("param '{name}': {reason}")]
    TypeMismatch { name: String, reason: String },

    /// Failure against the descriptor's parameter rule tree (e.g. an
    /// exactly-one-of group with no member supplied)
    #[error("{0}")]
    Rule(String),
}

impl ParameterError {
    /// The parameter this error refers to, when it names one.
    pub fn param(&self) -> Option<&str> {
        match self {
            ParameterError::MissingRequired(name) => Some(name),
            ParameterError::Unknown { name, .. } => Some(name),
            ParameterError::TypeMismatch { name, .. } => Some(name),
            ParameterError::Rule(_) => None,
        }
    }
}

/// Value-shape problems found by per-field validators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("param '{param}': {reason}")]
pub struct ValidationError {
    pub param: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            reason: reason.into(),
        }
    }
}

/// Errors from the convergence checker.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("timeout of {timeout:?} expired waiting for '{expect}', last was '{last}'")]
    Timeout {
        timeout: std::time::Duration,
        expect: String,
        last: String,
    },

    /// The polled state-read itself failed; aborts the check immediately.
    #[error("fetch: {0}")]
    Fetch(#[source] anyhow::Error),
}

fn format_list<E: std::fmt::Display>(errs: &[E]) -> String {
    errs.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn suggestion_help(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(", did you mean '{}'?", s),
        None => String::new(),
    }
}
