//! The registry capability the resolver works against.

use indexmap::IndexMap;
use phial_definitions::{TagCollection, TagKey, Value};

/// A live registry of parameters, service instances and tag collections.
///
/// Implemented by whatever container hosts the compiled definitions; the
/// resolver only ever queries, never mutates.
pub trait ServiceRegistry {
    /// The host's representation of a constructed service.
    type Instance: Clone;

    /// Whether any entry is registered under `key`.
    fn has(&self, key: &str) -> bool;

    /// The parameter value registered under `key`.
    fn parameter(&self, key: &str) -> Option<Value>;

    /// The service instance registered under `key`.
    fn instance(&self, key: &str) -> Option<Self::Instance>;

    /// The tag collection registered under the tag token (`#name`).
    fn tag_collection(&self, key: &str) -> Option<&TagCollection>;
}

/// The result of resolving one argument.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolved<I> {
    /// A plain value (possibly with parameters substituted into it).
    Value(Value),
    /// A live service instance.
    Instance(I),
    /// A resolved tag collection, keyed the way the collection was.
    Collection(IndexMap<TagKey, I>),
}

impl<I> Resolved<I> {
    /// The value, if this resolved to one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Resolved::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The instance, if this resolved to one.
    pub fn as_instance(&self) -> Option<&I> {
        match self {
            Resolved::Instance(instance) => Some(instance),
            _ => None,
        }
    }
}
