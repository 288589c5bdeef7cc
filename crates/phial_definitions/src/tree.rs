//! The typed definition model produced by normalization.
//!
//! Normalization passes operate on raw [`Value`](crate::Value) trees; the
//! final binding pass lowers them into these types, which the reference
//! validator checks and the runtime consumes. Factory fields are kept raw
//! (rather than collapsed into an enum) so that inconsistent factory styles
//! survive lowering and can be reported by the reference validator.

use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A complete, flat, fully-qualified definition set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DefinitionTree {
    /// Parameter values by fully-qualified key.
    pub parameters: IndexMap<String, Value>,
    /// Service definitions by fully-qualified key.
    pub services: IndexMap<String, ServiceDef>,
    /// Extensions that could not be applied (their target was missing).
    ///
    /// Successfully applied extensions are consumed during normalization;
    /// anything left here was already reported as a normalisation error.
    pub extensions: IndexMap<String, ExtensionDef>,
}

/// A single service definition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDef {
    /// The class to instantiate. Absent for aliases and factory-only stubs.
    pub class: Option<String>,
    /// Constructor arguments, in order.
    pub arguments: Vec<Argument>,
    /// Post-construction method calls, in order.
    pub calls: Vec<CallDef>,
    /// Tags attaching this service to named collections.
    pub tags: Vec<TagDef>,
    /// Factory class for static-factory construction.
    pub factory_class: Option<String>,
    /// Factory service reference (`@key`) for instance-factory construction.
    pub factory_service: Option<String>,
    /// The factory method to invoke.
    pub factory_method: Option<String>,
    /// Service reference (`@key`) this definition is an alias of.
    pub alias_of: Option<String>,
    /// Whether the service is excluded from direct external lookup.
    pub private: bool,
    /// Whether the service is a stub that must never be constructed.
    pub stub: bool,
}

impl ServiceDef {
    /// Returns `true` if this definition aliases another service.
    pub fn is_alias(&self) -> bool {
        self.alias_of.is_some()
    }
}

/// A constructor or call argument: a value with an optional name for
/// named-argument style.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    /// The argument name, for keyed argument lists.
    pub name: Option<String>,
    /// The argument value.
    pub value: Value,
}

impl Argument {
    /// A positional argument.
    pub fn positional(value: impl Into<Value>) -> Self {
        Self {
            name: None,
            value: value.into(),
        }
    }

    /// A named argument.
    pub fn named(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
        }
    }
}

/// A post-construction method call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CallDef {
    /// The method to call.
    pub method: String,
    /// The call arguments, in order.
    pub arguments: Vec<Argument>,
}

/// A canonicalized tag record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TagDef {
    /// The tag (collection) name.
    pub tag: String,
    /// An explicit collection key for this member.
    pub name: Option<String>,
    /// The member's sort order within the collection.
    pub order: Option<i64>,
}

impl TagDef {
    /// A tag with no explicit name or order.
    pub fn bare(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            name: None,
            order: None,
        }
    }
}

/// Calls and tags declared outside a service, to be appended to it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensionDef {
    /// Extra method calls to append to the target service.
    pub calls: Vec<CallDef>,
    /// Extra tags to append to the target service.
    pub tags: Vec<TagDef>,
}
