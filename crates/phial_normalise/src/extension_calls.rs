//! Extension shorthand expansion.
//!
//! An extension declared as a bare list is shorthand for a `calls` list;
//! this pass rewrites `service: [ ... ]` into `service: {calls: [ ... ]}`
//! while the documents are still separated by namespace.

use indexmap::IndexMap;
use phial_definitions::Value;

/// Expands the bare-list shorthand in every namespace's extensions.
pub fn normalise(mut documents: IndexMap<String, Value>) -> IndexMap<String, Value> {
    for document in documents.values_mut() {
        let Some(map) = document.as_map_mut() else {
            continue;
        };
        let Some(extensions) = map.get_mut("extensions").and_then(Value::as_map_mut) else {
            continue;
        };
        for extension in extensions.values_mut() {
            if let Value::Sequence(calls) = extension {
                let mut expanded = IndexMap::new();
                expanded.insert("calls".to_string(), Value::Sequence(std::mem::take(calls)));
                *extension = Value::Map(expanded);
            }
        }
    }
    documents
}
