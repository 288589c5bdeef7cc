//! Errors reported by the schema linter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A problem with a schema definition itself.
///
/// Messages are templates with `%s` placeholders filled from the
/// replacement list, so callers can group or filter on the template while
/// still rendering a precise message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchemaLintError {
    message: String,
    replacements: Vec<String>,
}

impl SchemaLintError {
    /// Creates a lint error from a message template and its replacements.
    pub fn new<I, S>(message: impl Into<String>, replacements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            message: message.into(),
            replacements: replacements.into_iter().map(Into::into).collect(),
        }
    }

    /// The raw message template.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The positional replacement values.
    pub fn replacements(&self) -> &[String] {
        &self.replacements
    }
}

impl fmt::Display for SchemaLintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut remainder = self.message.as_str();
        let mut replacements = self.replacements.iter();
        while let Some(pos) = remainder.find("%s") {
            f.write_str(&remainder[..pos])?;
            match replacements.next() {
                Some(replacement) => f.write_str(replacement)?,
                None => f.write_str("%s")?,
            }
            remainder = &remainder[pos + 2..];
        }
        f.write_str(remainder)
    }
}
