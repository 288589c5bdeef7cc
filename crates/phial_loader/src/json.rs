//! JSON definition-file loader.

use crate::error::LoaderError;
use crate::loader::{has_extension, load_with, Loader};
use phial_definitions::Value;
use std::path::Path;

/// Loads `.json` definition files.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonLoader;

impl JsonLoader {
    /// Creates a new JSON loader.
    pub fn new() -> Self {
        Self
    }
}

impl Loader for JsonLoader {
    fn name(&self) -> &str {
        "JSON loader"
    }

    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["json"])
    }

    fn load_file(&self, path: &Path) -> Result<Value, LoaderError> {
        load_with(path, |contents| {
            serde_json::from_str(contents).map_err(|e| e.to_string())
        })
    }
}
