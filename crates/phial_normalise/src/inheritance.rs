//! Inheritance resolution between abstract templates and concrete services.
//!
//! Abstract entries are split off first; concrete services with an
//! `extends` reference are then merged with their template chain. Merging
//! is deep-replace (the more specific definition wins per key) except for
//! `calls` and `tags`, which concatenate child-own entries first, then each
//! parent's in chain order.

use crate::raw::RawTree;
use indexmap::IndexMap;
use phial_common::service_key;
use phial_definitions::{deep_replace_maps, Value};
use phial_diagnostics::ValidationError;

/// Resolves every `extends` chain, removing abstract templates from the tree.
pub fn normalise(tree: RawTree) -> (RawTree, Vec<ValidationError>) {
    let mut errors = Vec::new();
    let mut abstracts: IndexMap<String, IndexMap<String, Value>> = IndexMap::new();
    let mut services: IndexMap<String, Value> = IndexMap::new();

    for (key, definition) in tree.services {
        let is_abstract = definition
            .as_map()
            .is_some_and(|map| map.get("abstract").is_some_and(Value::is_truthy));
        if is_abstract {
            if let Value::Map(mut template) = definition {
                template.shift_remove("abstract");
                abstracts.insert(key, template);
            }
        } else {
            services.insert(key, definition);
        }
    }

    let mut resolved = IndexMap::new();
    for (key, original) in &services {
        let Some(definition) = original.as_map() else {
            resolved.insert(key.clone(), original.clone());
            continue;
        };

        match merge_chain(key, definition, &abstracts, &mut errors) {
            Some(merged) => resolved.insert(key.clone(), Value::Map(merged)),
            // circular chains leave the stored definition untouched
            None => resolved.insert(key.clone(), original.clone()),
        };
    }

    let tree = RawTree {
        parameters: tree.parameters,
        services: resolved,
        extensions: tree.extensions,
    };
    (tree, errors)
}

/// Walks one service's `extends` chain, merging templates in.
///
/// Returns `None` on circular inheritance; a chain that hits a missing or
/// non-abstract parent is abandoned at that point but keeps the merges made
/// so far.
fn merge_chain(
    key: &str,
    definition: &IndexMap<String, Value>,
    abstracts: &IndexMap<String, IndexMap<String, Value>>,
    errors: &mut Vec<ValidationError>,
) -> Option<IndexMap<String, Value>> {
    let mut merged = definition.clone();
    let mut chain: Vec<String> = Vec::new();

    while let Some(extends_value) = merged.shift_remove("extends") {
        let extends = match extends_value.as_str() {
            Some(reference) => service_key(reference).to_string(),
            None => {
                errors.push(
                    ValidationError::normalisation(format!(
                        "The service definition for '{key}' has a malformed extends reference"
                    ))
                    .with_context("service", key),
                );
                break;
            }
        };

        let Some(template) = abstracts.get(&extends) else {
            errors.push(
                ValidationError::normalisation(format!(
                    "The service definition for '{key}' extends '{extends}', \
                     which is not an abstract service"
                ))
                .with_context("service", key),
            );
            break;
        };

        if chain.contains(&extends) {
            chain.push(extends);
            let chain_value =
                Value::Sequence(chain.iter().map(|link| Value::from(link.as_str())).collect());
            errors.push(
                ValidationError::normalisation(format!(
                    "The service definition for '{key}' has circular inheritance"
                ))
                .with_context("service", key)
                .with_context("chain", chain_value),
            );
            return None;
        }
        chain.push(extends.clone());

        let calls = list_field(&merged, "calls");
        let tags = list_field(&merged, "tags");

        merged = deep_replace_maps(template, &merged);
        merged.insert(
            "calls".to_string(),
            Value::Sequence(concat(calls, list_field(template, "calls"))),
        );
        merged.insert(
            "tags".to_string(),
            Value::Sequence(concat(tags, list_field(template, "tags"))),
        );
    }

    Some(merged)
}

fn list_field(map: &IndexMap<String, Value>, key: &str) -> Vec<Value> {
    map.get(key)
        .and_then(Value::as_sequence)
        .map(<[Value]>::to_vec)
        .unwrap_or_default()
}

fn concat(mut first: Vec<Value>, second: Vec<Value>) -> Vec<Value> {
    first.extend(second);
    first
}
