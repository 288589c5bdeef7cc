//! The normalization pipeline: raw namespaced documents in, one flat,
//! fully-qualified, typed definition tree out.
//!
//! Passes run in a fixed order, each taking its input by value and
//! returning a fresh output plus any accumulated errors:
//!
//! 1. [`extension_calls`] — expands bare-list extension shorthand
//! 2. [`namespace`] — merges namespaces, qualifying keys and references
//! 3. [`inheritance`] — resolves `extends` chains against abstract templates
//! 4. [`apply_extensions`] — appends extension calls/tags to their targets
//! 5. [`tag`] — canonicalizes the tag shorthand forms
//! 6. [`bind`] — lowers the raw tree into the typed [`DefinitionTree`]
//!
//! The chain aborts after the namespace or inheritance pass if that pass
//! reported errors, so later passes never operate on a half-merged tree.

#![warn(missing_docs)]

pub mod apply_extensions;
pub mod bind;
pub mod extension_calls;
pub mod inheritance;
pub mod namespace;
pub mod raw;
pub mod tag;

pub use raw::RawTree;

use indexmap::IndexMap;
use phial_definitions::{DefinitionTree, Value};
use phial_diagnostics::ValidationError;

/// Runs the full normalization chain over per-namespace documents.
///
/// `documents` maps namespace name to that namespace's merged raw document;
/// iteration order is the namespace processing order.
pub fn normalise(
    documents: IndexMap<String, Value>,
) -> (DefinitionTree, Vec<ValidationError>) {
    let documents = extension_calls::normalise(documents);

    let (raw, errors) = namespace::normalise(&documents);
    if !errors.is_empty() {
        return (DefinitionTree::default(), errors);
    }

    let (raw, errors) = inheritance::normalise(raw);
    if !errors.is_empty() {
        return (DefinitionTree::default(), errors);
    }

    let (raw, mut errors) = apply_extensions::normalise(raw);
    let raw = tag::normalise(raw);

    let (tree, bind_errors) = bind::bind(raw);
    errors.extend(bind_errors);
    (tree, errors)
}
