//! The host capability consulted for class, method and constant queries.
//!
//! The reference validator and the runtime resolver never inspect a live
//! type system. The host environment supplies a [`HostRegistry`] describing
//! which classes, interfaces, methods and constants exist, which keeps both
//! components testable against a purely declarative registry.

use crate::value::Value;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Queries the host environment answers about its type system.
pub trait HostRegistry {
    /// Whether a class with this name exists.
    fn class_exists(&self, name: &str) -> bool;

    /// Whether an interface with this name exists.
    fn interface_exists(&self, name: &str) -> bool;

    /// Whether the class has a method with this name.
    fn method_exists(&self, class: &str, method: &str) -> bool;

    /// Whether the class method is static.
    fn method_is_static(&self, class: &str, method: &str) -> bool;

    /// Whether a constant with this (possibly `Class::CONST`-qualified)
    /// name is defined.
    fn constant_defined(&self, name: &str) -> bool;

    /// The value of a defined constant.
    fn constant_value(&self, name: &str) -> Option<Value>;
}

#[derive(Clone, Debug, Default)]
struct ClassEntry {
    methods: HashSet<String>,
    static_methods: HashSet<String>,
}

/// A [`HostRegistry`] built from declared data.
///
/// Hosts that know their class surface up front register it here; tests use
/// it as a stand-in for a real runtime.
#[derive(Clone, Debug, Default)]
pub struct StaticHostRegistry {
    classes: HashMap<String, ClassEntry>,
    interfaces: HashSet<String>,
    constants: IndexMap<String, Value>,
}

impl StaticHostRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a class with no methods.
    pub fn with_class(mut self, name: impl Into<String>) -> Self {
        self.classes.entry(name.into()).or_default();
        self
    }

    /// Declares an instance method on a class, declaring the class if needed.
    pub fn with_method(mut self, class: impl Into<String>, method: impl Into<String>) -> Self {
        self.classes
            .entry(class.into())
            .or_default()
            .methods
            .insert(method.into());
        self
    }

    /// Declares a static method on a class, declaring the class if needed.
    pub fn with_static_method(
        mut self,
        class: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        let entry = self.classes.entry(class.into()).or_default();
        let method = method.into();
        entry.methods.insert(method.clone());
        entry.static_methods.insert(method);
        self
    }

    /// Declares an interface.
    pub fn with_interface(mut self, name: impl Into<String>) -> Self {
        self.interfaces.insert(name.into());
        self
    }

    /// Declares a constant, qualified (`Class::CONST`) or bare.
    pub fn with_constant(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constants.insert(name.into(), value.into());
        self
    }
}

impl HostRegistry for StaticHostRegistry {
    fn class_exists(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    fn interface_exists(&self, name: &str) -> bool {
        self.interfaces.contains(name)
    }

    fn method_exists(&self, class: &str, method: &str) -> bool {
        self.classes
            .get(class)
            .is_some_and(|entry| entry.methods.contains(method))
    }

    fn method_is_static(&self, class: &str, method: &str) -> bool {
        self.classes
            .get(class)
            .is_some_and(|entry| entry.static_methods.contains(method))
    }

    fn constant_defined(&self, name: &str) -> bool {
        self.constants.contains_key(name)
    }

    fn constant_value(&self, name: &str) -> Option<Value> {
        self.constants.get(name).cloned()
    }
}
