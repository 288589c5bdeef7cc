//! TOML definition-file loader.

use crate::error::LoaderError;
use crate::loader::{has_extension, load_with, Loader};
use phial_definitions::Value;
use std::path::Path;

/// Loads `.toml` definition files.
#[derive(Clone, Copy, Debug, Default)]
pub struct TomlLoader;

impl TomlLoader {
    /// Creates a new TOML loader.
    pub fn new() -> Self {
        Self
    }
}

impl Loader for TomlLoader {
    fn name(&self) -> &str {
        "TOML loader"
    }

    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["toml"])
    }

    fn load_file(&self, path: &Path) -> Result<Value, LoaderError> {
        load_with(path, |contents| {
            toml::from_str(contents).map_err(|e| e.to_string())
        })
    }
}
