//! Hard-stop errors for the compile pipeline.

use phial_loader::{LoaderError, LocatorError};

/// Errors that abort a compilation outright.
///
/// Accumulated [`ValidationError`](phial_diagnostics::ValidationError)s are
/// not represented here; they surface through the abort policy as a
/// [`Validation`](CompileError::Validation) message at a phase boundary.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A config file could not be located.
    #[error(transparent)]
    Locator(#[from] LocatorError),

    /// A config file could not be read or parsed.
    #[error(transparent)]
    Loader(#[from] LoaderError),

    /// Validation errors remained at a phase boundary.
    #[error("{0}")]
    Validation(String),
}
