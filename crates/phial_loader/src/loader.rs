//! The loader abstraction shared by every file format.

use crate::error::LoaderError;
use phial_definitions::Value;
use std::path::Path;

/// Parses one concrete file format into a raw definition document.
pub trait Loader {
    /// A short human-readable name for diagnostics.
    fn name(&self) -> &str;

    /// Whether this loader can handle the given file.
    fn supports(&self, path: &Path) -> bool;

    /// Loads and parses the file.
    ///
    /// Implementations must return [`LoaderError::NotAMap`] when the parsed
    /// document is not a keyed map: a definition file's top level is always
    /// a map.
    fn load_file(&self, path: &Path) -> Result<Value, LoaderError>;
}

/// Shared helper: reads the file, parses via `parse`, and checks the
/// top-level shape.
pub(crate) fn load_with<F>(path: &Path, parse: F) -> Result<Value, LoaderError>
where
    F: FnOnce(&str) -> Result<Value, String>,
{
    let contents = std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document = parse(&contents).map_err(|message| LoaderError::Parse {
        path: path.to_path_buf(),
        message,
    })?;
    if document.as_map().is_none() {
        return Err(LoaderError::NotAMap {
            path: path.to_path_buf(),
        });
    }
    Ok(document)
}

/// Shared helper: case-insensitive extension check.
pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(ext))
        })
}
