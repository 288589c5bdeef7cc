//! YAML definition-file loader.

use crate::error::LoaderError;
use crate::loader::{has_extension, load_with, Loader};
use phial_definitions::Value;
use std::path::Path;

/// Loads `.yml` / `.yaml` definition files.
#[derive(Clone, Copy, Debug, Default)]
pub struct YamlLoader;

impl YamlLoader {
    /// Creates a new YAML loader.
    pub fn new() -> Self {
        Self
    }
}

impl Loader for YamlLoader {
    fn name(&self) -> &str {
        "YAML loader"
    }

    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["yml", "yaml"])
    }

    fn load_file(&self, path: &Path) -> Result<Value, LoaderError> {
        load_with(path, |contents| {
            serde_yaml::from_str(contents).map_err(|e| e.to_string())
        })
    }
}
