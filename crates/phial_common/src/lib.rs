//! Shared leaf utilities for the phial configuration compiler.
//!
//! This crate holds the pieces every other phial crate builds on: the
//! embedded-reference sigil syntax and its scanner, namespaced-key
//! manipulation, and the opaque keys private services are registered under.

#![warn(missing_docs)]

pub mod hash;
pub mod keys;
pub mod sigil;

pub use hash::{private_service_key, OpaqueKey};
pub use keys::{add_namespace_to_key, is_key_namespaced, namespace_of_key, qualify_key};
pub use sigil::{
    find_next_constant, find_next_parameter, is_service_reference, is_tag_reference,
    replace_constant_reference, replace_parameter_reference, service_key, service_reference,
    CONSTANT_SIGIL, NAMESPACE_SEPARATOR, PARAMETER_SIGIL, SERVICE_SIGIL, TAG_SIGIL,
};
