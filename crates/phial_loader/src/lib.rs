//! Definition-file loading: format loaders, the loader registry, and the
//! config file locator.
//!
//! Loaders turn a file on disk into a raw [`Value`](phial_definitions::Value)
//! document; the registry picks the right loader by trying each registered
//! one in order; the locator turns bare filenames into absolute paths using
//! a relative-first, then search-path strategy.

#![warn(missing_docs)]

pub mod error;
pub mod json;
pub mod loader;
pub mod locator;
pub mod registry;
pub mod toml_loader;
pub mod yaml;

pub use error::{LoaderError, LocatorError};
pub use json::JsonLoader;
pub use loader::Loader;
pub use locator::ConfigLocator;
pub use registry::LoaderRegistry;
pub use toml_loader::TomlLoader;
pub use yaml::YamlLoader;
