//! Token scanning for the reference validator.

use phial_common::{
    find_next_constant, find_next_parameter, is_service_reference, is_tag_reference,
    replace_constant_reference, replace_parameter_reference, service_key,
};
use phial_definitions::{DefinitionTree, HostRegistry, Value};
use phial_diagnostics::ValidationError;

/// What to skip while scanning a value.
#[derive(Clone, Copy, Debug, Default)]
pub struct CheckOptions {
    /// Skip service-reference checking (used inside parameter values and
    /// tag definitions, where `@...` strings are not service lookups).
    pub skip_services: bool,
    /// Skip parameter-token checking.
    pub skip_parameters: bool,
    /// Skip constant-token checking.
    pub skip_constants: bool,
}

impl CheckOptions {
    /// Options with service checking disabled.
    pub fn skipping_services() -> Self {
        Self {
            skip_services: true,
            ..Self::default()
        }
    }
}

/// References discovered while scanning a value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FoundReferences {
    /// Referenced parameter keys.
    pub parameters: Vec<String>,
    /// Referenced service keys.
    pub services: Vec<String>,
    /// Referenced tag-collection tokens (`#name`).
    pub tags: Vec<String>,
}

impl FoundReferences {
    fn extend(&mut self, other: FoundReferences) {
        self.parameters.extend(other.parameters);
        self.services.extend(other.services);
        self.tags.extend(other.tags);
    }
}

/// Scans values for embedded references, checking each against the
/// compiled tree and the host capability.
pub struct ReferenceValidatorHelper<'a> {
    tree: &'a DefinitionTree,
    host: &'a dyn HostRegistry,
    max_parameter_references: usize,
}

impl<'a> ReferenceValidatorHelper<'a> {
    /// Creates a helper over a compiled tree and a host capability.
    pub fn new(tree: &'a DefinitionTree, host: &'a dyn HostRegistry) -> Self {
        Self {
            tree,
            host,
            max_parameter_references: 100,
        }
    }

    /// Recursively scans a value tree.
    ///
    /// String map keys are scanned with service checking disabled: an
    /// argument name shaped like `@x` is never a service lookup.
    pub fn check_value_tree(
        &self,
        value: &Value,
        options: CheckOptions,
    ) -> (Vec<ValidationError>, FoundReferences) {
        let mut errors = Vec::new();
        let mut references = FoundReferences::default();

        match value {
            Value::String(string) => {
                let (string_errors, string_references) = self.check_value(string, options);
                errors.extend(string_errors);
                references.extend(string_references);
            }
            Value::Sequence(items) => {
                for item in items {
                    let (item_errors, item_references) = self.check_value_tree(item, options);
                    errors.extend(item_errors);
                    references.extend(item_references);
                }
            }
            Value::Map(entries) => {
                for (key, item) in entries {
                    let key_options = CheckOptions {
                        skip_services: true,
                        ..options
                    };
                    let (key_errors, key_references) = self.check_value(key, key_options);
                    errors.extend(key_errors);
                    references.extend(key_references);

                    let (item_errors, item_references) = self.check_value_tree(item, options);
                    errors.extend(item_errors);
                    references.extend(item_references);
                }
            }
            _ => {}
        }

        (errors, references)
    }

    /// Scans one string for constant, parameter, service and tag references.
    pub fn check_value(
        &self,
        value: &str,
        options: CheckOptions,
    ) -> (Vec<ValidationError>, FoundReferences) {
        let mut errors = Vec::new();
        let mut references = FoundReferences::default();

        if !options.skip_constants {
            errors.extend(self.check_constant_references(value));
        }

        if !options.skip_parameters {
            let (parameter_errors, parameters) = self.check_parameter_references(value);
            errors.extend(parameter_errors);
            references.parameters = parameters;
        }

        if !options.skip_services {
            if is_tag_reference(value) {
                // an absent tag resolves to an empty collection, so only
                // the graph edge is recorded
                references.tags.push(value.to_string());
            } else if is_service_reference(value) {
                let key = service_key(value);
                if self.tree.services.contains_key(key) {
                    references.services.push(key.to_string());
                } else {
                    errors.push(ValidationError::reference(format!(
                        "The service '{value}' does not exist"
                    )));
                }
            }
        }

        (errors, references)
    }

    /// Checks each embedded parameter token against the declared parameters.
    pub fn check_parameter_references(
        &self,
        value: &str,
    ) -> (Vec<ValidationError>, Vec<String>) {
        let mut errors = Vec::new();
        let mut references = Vec::new();
        let mut remainder = value.to_string();
        let mut counter = 0;

        while let Some(parameter) = find_next_parameter(&remainder, 0) {
            let parameter = parameter.to_string();
            if self.tree.parameters.contains_key(&parameter) {
                references.push(parameter.clone());
            } else {
                errors.push(ValidationError::reference(format!(
                    "The parameter '{parameter}' does not exist"
                )));
            }
            // drop the token so the scan moves on
            remainder = replace_parameter_reference(&remainder, &parameter, "", true);

            counter += 1;
            if counter > self.max_parameter_references {
                errors.push(ValidationError::reference(format!(
                    "Exceeded the maximum number of parameter matches ('{value}')"
                )));
                break;
            }
        }

        (errors, references)
    }

    /// Checks each embedded constant token against the host capability.
    pub fn check_constant_references(&self, value: &str) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut remainder = value.to_string();

        while let Some(constant) = find_next_constant(&remainder, 0) {
            let constant = constant.to_string();
            let mut class_error = false;
            if let Some((class_name, constant_name)) = constant.split_once("::") {
                if !self.host.class_exists(class_name) && !self.host.interface_exists(class_name)
                {
                    errors.push(ValidationError::reference(format!(
                        "The class '{class_name}' for constant '{constant_name}' does not exist"
                    )));
                    class_error = true;
                }
            }
            if !class_error && !self.host.constant_defined(&constant) {
                errors.push(ValidationError::reference(format!(
                    "The constant '{constant}' does not exist"
                )));
            }
            remainder = replace_constant_reference(&remainder, &constant, "", true);
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use phial_definitions::{ServiceDef, StaticHostRegistry};

    fn tree() -> DefinitionTree {
        let mut tree = DefinitionTree::default();
        tree.parameters
            .insert("host".to_string(), Value::from("localhost"));
        tree.services.insert(
            "mailer".to_string(),
            ServiceDef {
                class: Some("App\\Mailer".to_string()),
                ..ServiceDef::default()
            },
        );
        tree
    }

    fn host() -> StaticHostRegistry {
        StaticHostRegistry::new()
            .with_class("App\\Mailer")
            .with_class("App\\Json")
            .with_constant("App\\Json::PRETTY", 1i64)
    }

    #[test]
    fn known_parameter_is_recorded() {
        let tree = tree();
        let host = host();
        let helper = ReferenceValidatorHelper::new(&tree, &host);
        let (errors, references) = helper.check_value("%host%", CheckOptions::default());
        assert!(errors.is_empty());
        assert_eq!(references.parameters, ["host"]);
    }

    #[test]
    fn unknown_parameter_is_an_error() {
        let tree = tree();
        let host = host();
        let helper = ReferenceValidatorHelper::new(&tree, &host);
        let (errors, _) = helper.check_value("%missing%", CheckOptions::default());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("'missing'"));
    }

    #[test]
    fn multiple_tokens_in_one_string() {
        let tree = tree();
        let host = host();
        let helper = ReferenceValidatorHelper::new(&tree, &host);
        let (errors, references) =
            helper.check_value("%host%:%port%", CheckOptions::default());
        assert_eq!(errors.len(), 1);
        assert_eq!(references.parameters, ["host"]);
    }

    #[test]
    fn service_reference_checked_and_recorded() {
        let tree = tree();
        let host = host();
        let helper = ReferenceValidatorHelper::new(&tree, &host);

        let (errors, references) = helper.check_value("@mailer", CheckOptions::default());
        assert!(errors.is_empty());
        assert_eq!(references.services, ["mailer"]);

        let (errors, _) = helper.check_value("@ghost", CheckOptions::default());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "The service '@ghost' does not exist");
    }

    #[test]
    fn service_checking_can_be_skipped() {
        let tree = tree();
        let host = host();
        let helper = ReferenceValidatorHelper::new(&tree, &host);
        let (errors, references) =
            helper.check_value("@ghost", CheckOptions::skipping_services());
        assert!(errors.is_empty());
        assert!(references.services.is_empty());
    }

    #[test]
    fn tag_reference_is_recorded_without_existence_check() {
        let tree = tree();
        let host = host();
        let helper = ReferenceValidatorHelper::new(&tree, &host);
        let (errors, references) = helper.check_value("#handlers", CheckOptions::default());
        assert!(errors.is_empty());
        assert_eq!(references.tags, ["#handlers"]);
    }

    #[test]
    fn qualified_constant_checks_class_then_constant() {
        let tree = tree();
        let host = host();
        let helper = ReferenceValidatorHelper::new(&tree, &host);

        let errors = helper.check_constant_references("^App\\Json::PRETTY^");
        assert!(errors.is_empty());

        let errors = helper.check_constant_references("^App\\Ghost::PRETTY^");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("class 'App\\Ghost'"));

        let errors = helper.check_constant_references("^App\\Json::COMPACT^");
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .message
            .contains("The constant 'App\\Json::COMPACT' does not exist"));
    }

    #[test]
    fn nested_values_are_scanned() {
        let tree = tree();
        let host = host();
        let helper = ReferenceValidatorHelper::new(&tree, &host);
        let value: Value = {
            let mut inner = IndexMap::new();
            inner.insert("url".to_string(), Value::from("%host%/api"));
            inner.insert("svc".to_string(), Value::from("@ghost"));
            Value::Sequence(vec![Value::Map(inner)])
        };
        let (errors, references) = helper.check_value_tree(&value, CheckOptions::default());
        assert_eq!(errors.len(), 1);
        assert_eq!(references.parameters, ["host"]);
    }

    #[test]
    fn map_keys_never_resolve_services() {
        let tree = tree();
        let host = host();
        let helper = ReferenceValidatorHelper::new(&tree, &host);
        let value: Value = {
            let mut map = IndexMap::new();
            map.insert("@ghost".to_string(), Value::Int(1));
            Value::Map(map)
        };
        let (errors, _) = helper.check_value_tree(&value, CheckOptions::default());
        assert!(errors.is_empty());
    }
}
