//! The phial definition data model.
//!
//! Documents are parsed into the dynamic [`Value`] tree, flow through the
//! normalization passes, and end up bound into the typed [`DefinitionTree`].
//! This crate also carries the deep-replace merge used when combining
//! documents, the [`TagCollection`] consumed by the runtime resolver, and
//! the [`HostRegistry`] capability the host environment supplies for class,
//! method and constant queries.

#![warn(missing_docs)]

pub mod host;
pub mod merge;
pub mod tag_collection;
pub mod tree;
pub mod value;

pub use host::{HostRegistry, StaticHostRegistry};
pub use merge::{deep_replace, deep_replace_maps};
pub use tag_collection::{build_tag_collections, TagCollection, TagKey};
pub use tree::{Argument, CallDef, DefinitionTree, ExtensionDef, ServiceDef, TagDef};
pub use value::{Value, ValueKind};
