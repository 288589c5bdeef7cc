//! Loader selection by registration order.

use crate::error::LoaderError;
use crate::json::JsonLoader;
use crate::loader::Loader;
use crate::toml_loader::TomlLoader;
use crate::yaml::YamlLoader;
use std::path::Path;

/// Holds the registered loaders and picks one per file.
///
/// Loaders are tried in registration order; the first whose
/// [`supports`](Loader::supports) returns `true` wins.
pub struct LoaderRegistry {
    loaders: Vec<Box<dyn Loader + Send + Sync>>,
}

impl LoaderRegistry {
    /// Creates a registry with no loaders.
    pub fn new() -> Self {
        Self {
            loaders: Vec::new(),
        }
    }

    /// Creates a registry with the standard YAML, JSON and TOML loaders.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.add_loader(Box::new(YamlLoader::new()));
        registry.add_loader(Box::new(JsonLoader::new()));
        registry.add_loader(Box::new(TomlLoader::new()));
        registry
    }

    /// Appends a loader to the registration order.
    pub fn add_loader(&mut self, loader: Box<dyn Loader + Send + Sync>) {
        self.loaders.push(loader);
    }

    /// Finds the first loader that supports `path`.
    pub fn find_loader(&self, path: &Path) -> Result<&(dyn Loader + Send + Sync), LoaderError> {
        self.loaders
            .iter()
            .find(|loader| loader.supports(path))
            .map(|boxed| boxed.as_ref())
            .ok_or_else(|| LoaderError::Unsupported {
                path: path.to_path_buf(),
            })
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
