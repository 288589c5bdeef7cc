//! The binding pass: lowering the raw tree into the typed definition model.
//!
//! Shape problems the syntax validator would have caught are reported as
//! normalisation errors here rather than panicking, so the binder stays
//! safe to run on hand-built trees in tests.

use crate::raw::RawTree;
use crate::tag::canonicalise_tags;
use indexmap::IndexMap;
use phial_definitions::{
    Argument, CallDef, DefinitionTree, ExtensionDef, ServiceDef, TagDef, Value,
};
use phial_diagnostics::ValidationError;

/// Lowers a fully normalized raw tree into a [`DefinitionTree`].
pub fn bind(raw: RawTree) -> (DefinitionTree, Vec<ValidationError>) {
    let mut errors = Vec::new();
    let mut tree = DefinitionTree {
        parameters: raw.parameters,
        ..DefinitionTree::default()
    };

    for (key, definition) in raw.services {
        match bind_service(&key, &definition, &mut errors) {
            Some(service) => {
                tree.services.insert(key, service);
            }
            None => {
                errors.push(
                    ValidationError::normalisation(format!(
                        "The service definition for '{key}' is not an object"
                    ))
                    .with_context("service", key.as_str()),
                );
            }
        }
    }

    for (key, extension) in raw.extensions {
        let Some(map) = extension.as_map() else {
            continue;
        };
        tree.extensions.insert(
            key.clone(),
            ExtensionDef {
                calls: map
                    .get("calls")
                    .map(|calls| bind_calls(&key, calls, &mut errors))
                    .unwrap_or_default(),
                tags: map
                    .get("tags")
                    .map(|tags| bind_tags(&key, tags, &mut errors))
                    .unwrap_or_default(),
            },
        );
    }

    (tree, errors)
}

fn bind_service(
    key: &str,
    definition: &Value,
    errors: &mut Vec<ValidationError>,
) -> Option<ServiceDef> {
    let map = definition.as_map()?;

    let mut service = ServiceDef {
        class: string_field(map, "class"),
        factory_class: string_field(map, "factoryClass"),
        factory_service: string_field(map, "factoryService"),
        factory_method: string_field(map, "factoryMethod"),
        alias_of: string_field(map, "aliasOf"),
        private: map.get("private").is_some_and(Value::is_truthy),
        stub: map.get("stub").is_some_and(Value::is_truthy),
        ..ServiceDef::default()
    };

    if let Some(arguments) = map.get("arguments") {
        service.arguments = bind_arguments(arguments);
    }
    if let Some(calls) = map.get("calls") {
        service.calls = bind_calls(key, calls, errors);
    }
    if let Some(tags) = map.get("tags") {
        service.tags = bind_tags(key, tags, errors);
    }

    Some(service)
}

fn string_field(map: &IndexMap<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

fn bind_arguments(arguments: &Value) -> Vec<Argument> {
    match arguments {
        Value::Sequence(items) => items
            .iter()
            .map(|value| Argument {
                name: None,
                value: value.clone(),
            })
            .collect(),
        Value::Map(entries) => entries
            .iter()
            .map(|(name, value)| Argument {
                name: Some(name.clone()),
                value: value.clone(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn bind_calls(key: &str, calls: &Value, errors: &mut Vec<ValidationError>) -> Vec<CallDef> {
    let Some(entries) = calls.as_sequence() else {
        return Vec::new();
    };

    let mut bound = Vec::new();
    for entry in entries {
        let method = entry
            .as_map()
            .and_then(|call| call.get("method"))
            .and_then(Value::as_str);
        match method {
            Some(method) => bound.push(CallDef {
                method: method.to_string(),
                arguments: entry
                    .as_map()
                    .and_then(|call| call.get("arguments"))
                    .map(bind_arguments)
                    .unwrap_or_default(),
            }),
            None => errors.push(
                ValidationError::normalisation(format!(
                    "A call on '{key}' has no method name"
                ))
                .with_context("service", key),
            ),
        }
    }
    bound
}

fn bind_tags(key: &str, tags: &Value, errors: &mut Vec<ValidationError>) -> Vec<TagDef> {
    let mut bound = Vec::new();
    for entry in canonicalise_tags(tags) {
        let tag_name = entry
            .as_map()
            .and_then(|tag| tag.get("tag"))
            .and_then(Value::as_str);
        match tag_name {
            Some(tag_name) => bound.push(TagDef {
                tag: tag_name.to_string(),
                name: entry
                    .as_map()
                    .and_then(|tag| tag.get("name"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                order: entry
                    .as_map()
                    .and_then(|tag| tag.get("order"))
                    .and_then(Value::as_int),
            }),
            None => errors.push(
                ValidationError::normalisation(format!("A tag on '{key}' has no tag name"))
                    .with_context("service", key),
            ),
        }
    }
    bound
}
