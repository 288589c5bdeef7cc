//! Namespace merging and key qualification.
//!
//! Each namespace's document is folded into one tree. Every service key,
//! parameter key, and embedded service/parameter reference is qualified
//! with its owning namespace unless it already carries a known namespace
//! prefix. Map keys directly under `calls` and `arguments` are method and
//! argument names, never lookups, and are left untouched.

use crate::raw::RawTree;
use indexmap::IndexMap;
use phial_common::{
    find_next_parameter, is_service_reference, namespace_of_key, qualify_key,
    replace_parameter_reference, service_key, service_reference,
};
use phial_definitions::Value;
use phial_diagnostics::ValidationError;

struct Ctx<'a> {
    namespaces: &'a [String],
    current: &'a str,
}

/// Merges per-namespace documents into one fully-qualified tree.
pub fn normalise(documents: &IndexMap<String, Value>) -> (RawTree, Vec<ValidationError>) {
    let namespaces: Vec<String> = documents.keys().cloned().collect();
    let mut tree = RawTree::default();
    let mut errors = Vec::new();

    for (namespace, document) in documents {
        let ctx = Ctx {
            namespaces: &namespaces,
            current: namespace.as_str(),
        };
        let Some(document) = document.as_map() else {
            errors.push(
                ValidationError::normalisation(format!(
                    "The definitions for the '{namespace}' namespace are not an object"
                ))
                .with_context("namespace", namespace.as_str()),
            );
            continue;
        };

        if let Some(services) = document.get("services").and_then(Value::as_map) {
            for (key, definition) in services {
                let definition = normalise_tree(definition, &ctx, true, true);
                let key = qualify_key(key, &namespaces, namespace);
                store_service(&mut tree, &mut errors, &ctx, key, definition);
            }
        }

        if let Some(parameters) = document.get("parameters").and_then(Value::as_map) {
            for (key, value) in parameters {
                let qualified = qualify_key(key, &namespaces, namespace);
                let is_local =
                    namespace_of_key(&qualified, &namespaces).unwrap_or("") == namespace;
                if tree.parameters.contains_key(&qualified) && is_local {
                    // externally-set and first-declared values win
                    continue;
                }
                let value = normalise_tree(value, &ctx, false, true);
                tree.parameters.insert(qualified, value);
            }
        }

        if let Some(extensions) = document.get("extensions").and_then(Value::as_map) {
            for (service, extension) in extensions {
                let service = qualify_key(service, &namespaces, namespace);
                let extension = normalise_tree(extension, &ctx, true, true);
                let merged = match tree.extensions.get(&service) {
                    Some(existing) => merge_extension(existing, &extension),
                    None => extension,
                };
                tree.extensions.insert(service, merged);
            }
        }
    }

    (tree, errors)
}

/// Applies the service key-collision policy before storing a definition.
///
/// A plain redefinition is an error unless the existing entry is an alias.
/// A new alias overwrites an existing alias, except when the existing alias
/// came from another namespace and the new one points back into the key's
/// own namespace: the external alias keeps precedence over the local one.
fn store_service(
    tree: &mut RawTree,
    errors: &mut Vec<ValidationError>,
    ctx: &Ctx<'_>,
    key: String,
    definition: Value,
) {
    let Some(existing) = tree.services.get(&key) else {
        tree.services.insert(key, definition);
        return;
    };

    let existing_alias = existing
        .as_map()
        .and_then(|map| map.get("aliasOf"))
        .and_then(Value::as_str);
    let new_alias = definition
        .as_map()
        .and_then(|map| map.get("aliasOf"))
        .and_then(Value::as_str);

    let mut store = false;
    match new_alias {
        Some(new_alias) => {
            store = true;
            if let Some(existing_alias) = existing_alias {
                if !ctx.current.is_empty() {
                    let existing_alias_ns =
                        namespace_of_key(service_key(existing_alias), ctx.namespaces)
                            .unwrap_or("");
                    let this_alias_ns = namespace_of_key(service_key(new_alias), ctx.namespaces)
                        .unwrap_or("");
                    let this_key_ns = namespace_of_key(&key, ctx.namespaces).unwrap_or("");
                    if existing_alias_ns != ctx.current && this_alias_ns == this_key_ns {
                        store = false;
                    }
                }
            }
        }
        None => {
            if existing_alias.is_none() {
                let report_namespace = if ctx.current.is_empty() {
                    "root".to_string()
                } else {
                    format!("'{}'", ctx.current)
                };
                errors.push(
                    ValidationError::normalisation(format!(
                        "The service '{key}' has a definition in the {report_namespace} \
                         namespace, but has already been defined"
                    ))
                    .with_context("service", key.as_str()),
                );
            }
        }
    }

    if store {
        tree.services.insert(key, definition);
    }
}

/// Accumulates a later namespace's extension onto an earlier one.
fn merge_extension(first: &Value, second: &Value) -> Value {
    let (Some(first), Some(second)) = (first.as_map(), second.as_map()) else {
        return second.clone();
    };
    if first.is_empty() {
        return Value::Map(second.clone());
    }

    let mut merged = IndexMap::new();
    for key in ["calls", "tags"] {
        let mut combined = Vec::new();
        for side in [first, second] {
            if let Some(entries) = side.get(key).and_then(Value::as_sequence) {
                combined.extend(entries.iter().cloned());
            }
        }
        if !combined.is_empty() {
            merged.insert(key.to_string(), Value::Sequence(combined));
        }
    }
    Value::Map(merged)
}

/// Recursively qualifies strings inside a definition value.
///
/// `check_schema_keys` enables the special handling of `calls` and
/// `arguments`; `normalise_keys` controls whether the current level's map
/// keys are rewritten (they are not when directly under `arguments`).
fn normalise_tree(
    value: &Value,
    ctx: &Ctx<'_>,
    check_schema_keys: bool,
    normalise_keys: bool,
) -> Value {
    match value {
        Value::Map(map) => {
            let mut out = IndexMap::new();
            for (key, entry) in map {
                let (key, entry) = match key.as_str() {
                    "calls" if check_schema_keys => (key.clone(), normalise_calls(entry, ctx)),
                    "arguments" if check_schema_keys => {
                        (key.clone(), normalise_tree(entry, ctx, false, false))
                    }
                    _ => {
                        let entry = normalise_nested(entry, ctx);
                        let key = if normalise_keys {
                            normalise_string(key, ctx)
                        } else {
                            key.clone()
                        };
                        (key, entry)
                    }
                };
                out.insert(key, entry);
            }
            Value::Map(out)
        }
        Value::Sequence(items) => Value::Sequence(
            items
                .iter()
                .map(|item| normalise_nested(item, ctx))
                .collect(),
        ),
        Value::String(string) => Value::String(normalise_string(string, ctx)),
        other => other.clone(),
    }
}

fn normalise_nested(value: &Value, ctx: &Ctx<'_>) -> Value {
    match value {
        Value::String(string) => Value::String(normalise_string(string, ctx)),
        Value::Map(_) | Value::Sequence(_) => normalise_tree(value, ctx, false, true),
        other => other.clone(),
    }
}

fn normalise_calls(calls: &Value, ctx: &Ctx<'_>) -> Value {
    match calls {
        Value::Sequence(items) => Value::Sequence(
            items
                .iter()
                .map(|call| normalise_tree(call, ctx, true, false))
                .collect(),
        ),
        other => normalise_tree(other, ctx, true, false),
    }
}

/// Qualifies a single string: service references wholesale, parameter
/// tokens one at a time, everything else untouched.
fn normalise_string(string: &str, ctx: &Ctx<'_>) -> String {
    if is_service_reference(string) {
        let key = qualify_key(service_key(string), ctx.namespaces, ctx.current);
        return service_reference(&key);
    }

    let mut string = string.to_string();
    let mut offset = 0;
    loop {
        let Some(parameter) = find_next_parameter(&string, offset) else {
            break;
        };
        let parameter = parameter.to_string();
        let qualified = qualify_key(&parameter, ctx.namespaces, ctx.current);
        if qualified != parameter {
            string = replace_parameter_reference(&string, &parameter, &qualified, false);
        }
        // continue scanning after the token just handled
        match string[offset..].find(qualified.as_str()) {
            Some(position) => offset += position + qualified.len() + 1,
            None => break,
        }
    }
    string
}
