//! The schema-driven syntax validator.
//!
//! Schemas are themselves [`Value`] trees of directives (`type`, `children`,
//! `element`, `requiredChildren`, `empty`, `warning`, `oneOf`), interpreted
//! recursively against a raw document. Directives run in the order they
//! appear in the schema; a `type` directive whose alternatives include a
//! `@name` reference recurses into the named schema.

use crate::builtin::{builtin_schemas, ROOT_SCHEMA};
use indexmap::IndexMap;
use phial_common::is_service_reference;
use phial_definitions::{Value, ValueKind};
use phial_diagnostics::ValidationError;

/// Validates raw documents against a set of named schemas.
pub struct SyntaxValidator {
    schemas: IndexMap<String, Value>,
    root_schema: String,
}

impl SyntaxValidator {
    /// Creates a validator over the given named schemas.
    ///
    /// `root_schema` names the schema whole files are validated against.
    pub fn new(schemas: IndexMap<String, Value>, root_schema: impl Into<String>) -> Self {
        Self {
            schemas,
            root_schema: root_schema.into(),
        }
    }

    /// Creates a validator over the builtin definition-file schemas.
    pub fn with_builtin_schemas() -> Self {
        Self::new(builtin_schemas(), ROOT_SCHEMA)
    }

    /// Validates a whole definition file against the root schema.
    pub fn validate_file(&self, document: &Value, file_name: &str) -> Vec<ValidationError> {
        self.validate_schema_by_name(document, &self.root_schema, file_name, "")
    }

    fn validate_schema_by_name(
        &self,
        document: &Value,
        schema_name: &str,
        file_name: &str,
        element_path: &str,
    ) -> Vec<ValidationError> {
        match self.schemas.get(schema_name) {
            Some(schema) => self.validate_schema(document, schema, file_name, element_path),
            None => vec![self.syntax_error(
                format!("The schema '{schema_name}' does not exist"),
                file_name,
            )],
        }
    }

    fn validate_schema(
        &self,
        document: &Value,
        schema: &Value,
        file_name: &str,
        element_path: &str,
    ) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let Some(schema) = schema.as_map() else {
            errors.push(self.syntax_error(
                format!("The schema applied to '{element_path}' is malformed"),
                file_name,
            ));
            return errors;
        };

        for (directive_name, directive) in schema {
            match directive_name.as_str() {
                "type" => self.check_type_directive(
                    document,
                    directive,
                    file_name,
                    element_path,
                    &mut errors,
                ),
                "children" => self.check_children(
                    document,
                    directive,
                    file_name,
                    element_path,
                    &mut errors,
                ),
                "element" => {
                    self.check_element(document, directive, file_name, element_path, &mut errors)
                }
                "requiredChildren" => self.check_required_children(
                    document,
                    directive,
                    file_name,
                    element_path,
                    &mut errors,
                ),
                "empty" => {
                    if let Some(must_be_empty) = directive.as_bool() {
                        if document.is_empty() != must_be_empty {
                            let message = if must_be_empty {
                                format!("'{element_path}' must be empty")
                            } else {
                                format!("'{element_path}' cannot be empty")
                            };
                            errors.push(self.syntax_error(message, file_name));
                        }
                    }
                }
                "warning" => {
                    if let Some(message) = directive.as_str() {
                        errors.push(
                            ValidationError::warning(message)
                                .with_context("filename", file_name),
                        );
                    }
                }
                "oneOf" => {
                    self.check_one_of(document, directive, file_name, element_path, &mut errors)
                }
                // unknown directives are the schema linter's concern
                _ => {}
            }
        }

        errors
    }

    /// Handles the `type` directive: `@name` references recurse, plain
    /// alternatives are tried in order until one matches.
    fn check_type_directive(
        &self,
        document: &Value,
        directive: &Value,
        file_name: &str,
        element_path: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        let types = to_string_list(directive);
        let mut matched = false;
        for candidate in &types {
            if let Some(schema_name) = candidate.strip_prefix('@') {
                errors.extend(self.validate_schema_by_name(
                    document,
                    schema_name,
                    file_name,
                    element_path,
                ));
                matched = true;
            } else if check_type(candidate, document) {
                matched = true;
                break;
            }
        }

        if !matched {
            errors.push(self.syntax_error(
                format!(
                    "The type for '{element_path}' is not {}",
                    format_alternatives(&types)
                ),
                file_name,
            ));
        }
    }

    fn check_children(
        &self,
        document: &Value,
        directive: &Value,
        file_name: &str,
        element_path: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        let Some(document) = document.as_map() else {
            errors.push(self.syntax_error(
                format!("'{element_path}' is not an object"),
                file_name,
            ));
            return;
        };
        let Some(children) = directive.as_map() else {
            return;
        };

        let mut unexpected: Vec<&str> = document.keys().map(String::as_str).collect();
        for (child, child_schema) in children {
            if let Some(child_document) = document.get(child) {
                errors.extend(self.validate_schema(
                    child_document,
                    child_schema,
                    file_name,
                    &format!("{element_path}.{child}"),
                ));
            }
            unexpected.retain(|key| *key != child.as_str());
        }

        if !unexpected.is_empty() {
            errors.push(self.syntax_error(
                format!(
                    "'{element_path}' contains child elements that are not allowed: '{}'",
                    unexpected.join("', '")
                ),
                file_name,
            ));
        }
    }

    fn check_element(
        &self,
        document: &Value,
        directive: &Value,
        file_name: &str,
        element_path: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        match document {
            Value::Sequence(items) => {
                for (index, item) in items.iter().enumerate() {
                    errors.extend(self.validate_schema(
                        item,
                        directive,
                        file_name,
                        &format!("{element_path}.{index}"),
                    ));
                }
            }
            Value::Map(entries) => {
                for (key, item) in entries {
                    errors.extend(self.validate_schema(
                        item,
                        directive,
                        file_name,
                        &format!("{element_path}.{key}"),
                    ));
                }
            }
            _ => {
                errors.push(self.syntax_error(
                    format!("'{element_path}' is not an array"),
                    file_name,
                ));
            }
        }
    }

    fn check_required_children(
        &self,
        document: &Value,
        directive: &Value,
        file_name: &str,
        element_path: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        let Some(requirements) = directive.as_map() else {
            return;
        };
        let present = |child: &str| {
            document
                .as_map()
                .is_some_and(|map| map.contains_key(child))
        };

        for (child, requirement) in requirements {
            let should_check = match requirement {
                Value::Bool(true) => true,
                Value::Map(conditions) => {
                    if let Some(condition) = conditions.get("if") {
                        to_string_list(condition)
                            .iter()
                            .any(|dependency| present(dependency))
                    } else if let Some(condition) = conditions.get("ifNot") {
                        !to_string_list(condition)
                            .iter()
                            .any(|dependency| present(dependency))
                    } else {
                        false
                    }
                }
                _ => false,
            };

            if should_check && !present(child) {
                errors.push(self.syntax_error(
                    format!("The required '{child}' attribute of '{element_path}' was missing"),
                    file_name,
                ));
            }
        }
    }

    /// Handles `oneOf`: the first candidate whose `type` matches the
    /// document's runtime type is selected and validated fully.
    fn check_one_of(
        &self,
        document: &Value,
        directive: &Value,
        file_name: &str,
        element_path: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        let Some(candidates) = directive.as_sequence() else {
            return;
        };

        for candidate in candidates {
            let type_matches = candidate
                .as_map()
                .and_then(|schema| schema.get("type"))
                .map(|types| {
                    to_string_list(types)
                        .iter()
                        .any(|candidate_type| check_type(candidate_type, document))
                })
                .unwrap_or(false);
            if type_matches {
                errors.extend(self.validate_schema(document, candidate, file_name, element_path));
                return;
            }
        }

        errors.push(self.syntax_error(
            format!("The definition for '{element_path}' is invalid"),
            file_name,
        ));
    }

    fn syntax_error(&self, message: String, file_name: &str) -> ValidationError {
        ValidationError::syntax(message).with_context("filename", file_name)
    }
}

/// Checks a document against one name from the type vocabulary.
fn check_type(candidate: &str, document: &Value) -> bool {
    match candidate {
        "any" => true,
        "string" | "bool" | "number" => document.kind().name() == candidate,
        "serviceReference" => document
            .as_str()
            .is_some_and(is_service_reference),
        "array" => matches!(document.kind(), ValueKind::List | ValueKind::Object),
        "list" => document.kind() == ValueKind::List,
        "object" => document.kind() == ValueKind::Object,
        _ => false,
    }
}

/// Accepts a string or a list of strings; anything else yields an empty list.
fn to_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Sequence(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Formats type alternatives as `'a', 'b' or 'c'`.
fn format_alternatives(types: &[String]) -> String {
    match types.split_last() {
        None => "''".to_string(),
        Some((last, [])) => format!("'{last}'"),
        Some((last, rest)) => format!(
            "'{}' or '{last}'",
            rest.iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("', '")
        ),
    }
}
