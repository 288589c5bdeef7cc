//! Structured validation errors accumulated across compilation phases.

use indexmap::IndexMap;
use phial_definitions::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of problem a [`ValidationError`] reports.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// A document's shape violates a schema.
    Syntax,
    /// A structural or merge-time problem: bad inheritance, an extension
    /// for a missing service, a key collision.
    Normalisation,
    /// A missing or circular parameter, service, constant, class, or
    /// method reference.
    Reference,
    /// An advisory; never fatal on its own.
    Warning,
}

impl ErrorKind {
    /// Returns `true` for the advisory kind.
    pub fn is_warning(self) -> bool {
        self == ErrorKind::Warning
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Syntax => f.write_str("syntax"),
            ErrorKind::Normalisation => f.write_str("normalisation"),
            ErrorKind::Reference => f.write_str("reference"),
            ErrorKind::Warning => f.write_str("warning"),
        }
    }
}

/// One accumulated compilation problem.
///
/// Errors are pure data: they carry a kind, a message, and an ordered
/// context map used for diagnostics (the offending service or parameter
/// key, the file, an inheritance chain, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// What kind of problem this is.
    pub kind: ErrorKind,
    /// The human-readable message.
    pub message: String,
    /// Diagnostic context, keyed by what the value describes.
    pub context: IndexMap<String, Value>,
}

impl ValidationError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: IndexMap::new(),
        }
    }

    /// Creates a syntax error.
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    /// Creates a normalisation error.
    pub fn normalisation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Normalisation, message)
    }

    /// Creates a reference error.
    pub fn reference(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Reference, message)
    }

    /// Creates a warning.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Warning, message)
    }

    /// Attaches a context entry.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attaches a context entry in place.
    pub fn add_context(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.context.insert(key.into(), value.into());
    }

    /// Returns `true` for warning-kind errors.
    pub fn is_warning(&self) -> bool {
        self.kind.is_warning()
    }

    /// Renders the context map as JSON for inclusion in abort messages.
    pub fn context_json(&self) -> String {
        serde_json::to_string(&self.context).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Attaches the same context entry to every error in a batch.
pub fn add_context_to_all(
    errors: &mut [ValidationError],
    key: impl Into<String>,
    value: impl Into<Value>,
) {
    let key = key.into();
    let value = value.into();
    for error in errors {
        error.add_context(key.clone(), value.clone());
    }
}
