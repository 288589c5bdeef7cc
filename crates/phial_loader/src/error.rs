//! Error types for file loading and location.

use std::path::PathBuf;

/// Errors raised while loading a definition file.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// The file could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// The file that failed to read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file contents could not be parsed.
    #[error("could not parse '{path}': {message}")]
    Parse {
        /// The file that failed to parse.
        path: PathBuf,
        /// The parser's message.
        message: String,
    },

    /// The parsed document was not a map.
    #[error("'{path}' does not parse to a map of definitions")]
    NotAMap {
        /// The offending file.
        path: PathBuf,
    },

    /// No registered loader supports the file.
    #[error("the file '{path}' is not supported by any of the available loaders")]
    Unsupported {
        /// The unsupported file.
        path: PathBuf,
    },
}

/// Errors raised while locating a config file.
#[derive(Debug, thiserror::Error)]
pub enum LocatorError {
    /// The file was not found in any configured location.
    #[error("the config file '{file}' could not be found in any of the configured paths{}", relative_note(.relative_to))]
    NotFound {
        /// The requested filename.
        file: String,
        /// The path the lookup was relative to, if any.
        relative_to: Option<PathBuf>,
    },
}

fn relative_note(relative_to: &Option<PathBuf>) -> String {
    match relative_to {
        Some(path) => format!(" (or relative to '{}')", path.display()),
        None => String::new(),
    }
}
