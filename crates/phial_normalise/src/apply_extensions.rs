//! Extension application: appending externally declared calls and tags to
//! their target services.

use crate::raw::RawTree;
use indexmap::IndexMap;
use phial_definitions::Value;
use phial_diagnostics::ValidationError;

/// Applies each extension to its target service.
///
/// A missing target is a normalisation error; the extension is left in the
/// tree (unapplied) and processing continues with the rest.
pub fn normalise(mut tree: RawTree) -> (RawTree, Vec<ValidationError>) {
    let mut errors = Vec::new();
    let mut unapplied = IndexMap::new();

    for (service_key, extension) in std::mem::take(&mut tree.extensions) {
        if !tree.services.contains_key(&service_key) {
            errors.push(
                ValidationError::normalisation(format!(
                    "An extension was found for '{service_key}' but that service does not exist"
                ))
                .with_context("service", service_key.as_str()),
            );
            unapplied.insert(service_key, extension);
            continue;
        }

        if !matches!(extension, Value::Map(_)) {
            unapplied.insert(service_key, extension);
            continue;
        }
        let fields: Vec<(String, Vec<Value>)> = extension
            .as_map()
            .map(|map| {
                map.iter()
                    .map(|(field, values)| {
                        let values = values
                            .as_sequence()
                            .map(<[Value]>::to_vec)
                            .unwrap_or_default();
                        (field.clone(), values)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let Some(service) = tree
            .services
            .get_mut(&service_key)
            .and_then(Value::as_map_mut)
        else {
            unapplied.insert(service_key, extension);
            continue;
        };

        for (field, values) in fields {
            let mut combined = service
                .get(&field)
                .and_then(Value::as_sequence)
                .map(<[Value]>::to_vec)
                .unwrap_or_default();
            combined.extend(values);
            service.insert(field, Value::Sequence(combined));
        }
    }

    tree.extensions = unapplied;
    (tree, errors)
}
