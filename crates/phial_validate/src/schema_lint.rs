//! The schema linter: validates schema definitions themselves.
//!
//! A malformed schema would otherwise silently validate everything as
//! passing, so the linter mirrors the syntax validator's directive
//! vocabulary and checks that each directive is well-formed, that
//! `requiredChildren` entries reference declared children, and that
//! `@name` type references resolve.

use indexmap::IndexMap;
use phial_definitions::Value;
use phial_diagnostics::SchemaLintError;

const DIRECTIVES: [&str; 7] = [
    "type",
    "children",
    "element",
    "requiredChildren",
    "empty",
    "warning",
    "oneOf",
];

const ALLOWED_TYPES: [&str; 8] = [
    "string",
    "number",
    "bool",
    "list",
    "array",
    "object",
    "serviceReference",
    "any",
];

/// Lints a schema document (a map with a `schemas` attribute).
#[derive(Clone, Copy, Debug, Default)]
pub struct SchemaLinter;

impl SchemaLinter {
    /// Creates a new linter.
    pub fn new() -> Self {
        Self
    }

    /// Lints every named schema in the document.
    pub fn lint(&self, document: &Value) -> Vec<SchemaLintError> {
        let schemas = document
            .as_map()
            .and_then(|map| map.get("schemas"))
            .and_then(Value::as_map)
            .filter(|schemas| !schemas.is_empty());
        let Some(schemas) = schemas else {
            return vec![SchemaLintError::new(
                "No 'schemas' attribute was found",
                Vec::<String>::new(),
            )];
        };

        let mut errors = Vec::new();
        for (name, schema) in schemas {
            self.lint_schema(name, schema, schemas, &mut errors);
        }
        errors
    }

    fn lint_schema(
        &self,
        name: &str,
        schema: &Value,
        all_schemas: &IndexMap<String, Value>,
        errors: &mut Vec<SchemaLintError>,
    ) {
        let Some(schema) = schema.as_map().filter(|map| !map.is_empty()) else {
            errors.push(SchemaLintError::new("The schema for %s is empty", [name]));
            return;
        };

        if !schema.contains_key("type") && !schema.contains_key("oneOf") {
            errors.push(SchemaLintError::new(
                "The schema for %s requires a 'type' or 'oneOf' directive",
                [name],
            ));
        }

        for (directive, value) in schema {
            match directive.as_str() {
                "type" => self.lint_type(name, directive, value, all_schemas, errors),
                "children" => self.lint_children(name, directive, value, all_schemas, errors),
                "element" => {
                    if is_not_schema(value) {
                        errors.push(SchemaLintError::new(
                            "The %s directive for the %s schema is not a schema",
                            [directive.as_str(), name],
                        ));
                    } else {
                        self.lint_schema(&format!("{name}.element"), value, all_schemas, errors);
                    }
                }
                "requiredChildren" => {
                    self.lint_required_children(name, directive, value, schema, errors)
                }
                "empty" => {
                    if value.as_bool().is_none() {
                        errors.push(SchemaLintError::new(
                            "The %s directive for the %s schema is not a boolean",
                            [directive.as_str(), name],
                        ));
                    }
                }
                "warning" => {
                    if value.as_str().is_none() {
                        errors.push(SchemaLintError::new(
                            "The %s directive for the %s schema is not a string",
                            [directive.as_str(), name],
                        ));
                    }
                }
                "oneOf" => self.lint_one_of(name, directive, value, all_schemas, errors),
                unexpected => {
                    errors.push(SchemaLintError::new(
                        "Unexpected directive %s for the %s schema",
                        [unexpected, name],
                    ));
                }
            }
        }
    }

    fn lint_type(
        &self,
        name: &str,
        directive: &str,
        value: &Value,
        all_schemas: &IndexMap<String, Value>,
        errors: &mut Vec<SchemaLintError>,
    ) {
        let Some(types) = as_string_list(value) else {
            errors.push(SchemaLintError::new(
                "The %s directive for the %s schema is not a string or list of strings",
                [directive, name],
            ));
            return;
        };

        for candidate in types {
            if let Some(schema_name) = candidate.strip_prefix('@') {
                if !all_schemas.contains_key(schema_name) {
                    errors.push(SchemaLintError::new(
                        "The %s directive for the %s schema refers to the %s schema \
                         which doesn't exist",
                        [directive, name, schema_name],
                    ));
                }
            } else if !ALLOWED_TYPES.contains(&candidate) {
                errors.push(SchemaLintError::new(
                    "The value '%s' for the %s directive for the %s schema is not a valid type",
                    [candidate, directive, name],
                ));
            }
        }
    }

    fn lint_children(
        &self,
        name: &str,
        directive: &str,
        value: &Value,
        all_schemas: &IndexMap<String, Value>,
        errors: &mut Vec<SchemaLintError>,
    ) {
        let Some(children) = value.as_map() else {
            errors.push(SchemaLintError::new(
                "The %s directive for the %s schema is not an object of named child schemas",
                [directive, name],
            ));
            return;
        };
        if children.is_empty() {
            errors.push(SchemaLintError::new(
                "The %s directive for the %s schema cannot be empty",
                [directive, name],
            ));
            return;
        }

        for (attribute, sub_schema) in children {
            if is_not_schema(sub_schema) {
                errors.push(SchemaLintError::new(
                    "The definition for the child %s of the %s schema is not a schema",
                    [attribute.as_str(), name],
                ));
            } else {
                self.lint_schema(&format!("{name}.{attribute}"), sub_schema, all_schemas, errors);
            }
        }
    }

    fn lint_required_children(
        &self,
        name: &str,
        directive: &str,
        value: &Value,
        schema: &IndexMap<String, Value>,
        errors: &mut Vec<SchemaLintError>,
    ) {
        let Some(requirements) = value.as_map() else {
            errors.push(SchemaLintError::new(
                "The %s directive for the %s schema is not an object of named requirements",
                [directive, name],
            ));
            return;
        };
        if requirements.is_empty() {
            errors.push(SchemaLintError::new(
                "The %s directive for the %s schema cannot be empty",
                [directive, name],
            ));
            return;
        }

        let children = schema
            .get("children")
            .and_then(Value::as_map)
            .filter(|children| !children.is_empty());
        let Some(children) = children else {
            errors.push(SchemaLintError::new(
                "The %s directive for the %s schema is set but the %s directive \
                 is empty or doesn't exist",
                [directive, name, "children"],
            ));
            return;
        };

        for (attribute, requirement) in requirements {
            if !children.contains_key(attribute) {
                errors.push(SchemaLintError::new(
                    "The required child %s of the %s schema is not defined in the %s directive",
                    [attribute.as_str(), name, "children"],
                ));
            }

            if matches!(requirement, Value::Bool(true)) {
                continue;
            }
            let Some(conditions) = requirement.as_map() else {
                errors.push(SchemaLintError::new(
                    "The requirements for the required child %s of the %s schema \
                     are not boolean true or a condition map",
                    [attribute.as_str(), name],
                ));
                continue;
            };

            for (condition, dependencies) in conditions {
                match condition.as_str() {
                    "if" | "ifNot" => {
                        let Some(dependencies) = as_string_list(dependencies) else {
                            errors.push(SchemaLintError::new(
                                "The %s requirements for the required child %s of the %s \
                                 schema is not a string or list of strings",
                                [condition.as_str(), attribute.as_str(), name],
                            ));
                            continue;
                        };
                        for dependency in dependencies {
                            if !children.contains_key(dependency) {
                                errors.push(SchemaLintError::new(
                                    "The requirements for required child %s of the %s schema \
                                     refer to the child %s which is not defined in the %s \
                                     directive",
                                    [attribute.as_str(), name, dependency, "children"],
                                ));
                            }
                        }
                    }
                    unexpected => {
                        errors.push(SchemaLintError::new(
                            "Unexpected requirement %s for required child %s of the %s schema",
                            [unexpected, attribute.as_str(), name],
                        ));
                    }
                }
            }
        }
    }

    fn lint_one_of(
        &self,
        name: &str,
        directive: &str,
        value: &Value,
        all_schemas: &IndexMap<String, Value>,
        errors: &mut Vec<SchemaLintError>,
    ) {
        let candidates = value.as_sequence().filter(|candidates| {
            candidates.iter().all(|candidate| {
                !is_not_schema(candidate)
                    && candidate
                        .as_map()
                        .is_some_and(|schema| schema.contains_key("type"))
            })
        });
        let Some(candidates) = candidates else {
            errors.push(SchemaLintError::new(
                "The %s directive for the %s schema is not a list of possible schemas",
                [directive, name],
            ));
            return;
        };

        for (index, candidate) in candidates.iter().enumerate() {
            self.lint_schema(&format!("{name}.oneOf[{index}]"), candidate, all_schemas, errors);
        }
    }
}

/// A value is a schema when it is a non-empty map whose keys are all known
/// directives.
fn is_not_schema(value: &Value) -> bool {
    match value.as_map() {
        Some(map) if !map.is_empty() => map
            .keys()
            .any(|key| !DIRECTIVES.contains(&key.as_str())),
        _ => true,
    }
}

fn as_string_list(value: &Value) -> Option<Vec<&str>> {
    match value {
        Value::String(s) => Some(vec![s.as_str()]),
        Value::Sequence(items) => items
            .iter()
            .map(Value::as_str)
            .collect::<Option<Vec<_>>>(),
        _ => None,
    }
}
