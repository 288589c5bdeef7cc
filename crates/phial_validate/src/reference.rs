//! The static reference validator.
//!
//! Runs once per compiled tree, independently of the syntax validator:
//! every referenced parameter, service, constant, class and method must
//! exist, and neither the parameter graph nor the combined service + tag
//! graph may contain a cycle. Errors never abort the scan; each offending
//! entry is reported with its key attached as context.

use crate::graph::ReferenceGraph;
use crate::reference_helper::{CheckOptions, ReferenceValidatorHelper};
use phial_common::{service_key, TAG_SIGIL};
use phial_definitions::{DefinitionTree, HostRegistry, ServiceDef};
use phial_diagnostics::{add_context_to_all, ValidationError};

/// Validates every cross-reference in a compiled tree.
pub struct ReferenceValidator<'a> {
    host: &'a dyn HostRegistry,
}

impl<'a> ReferenceValidator<'a> {
    /// Creates a validator over a host capability.
    pub fn new(host: &'a dyn HostRegistry) -> Self {
        Self { host }
    }

    /// Validates the tree, returning every problem found.
    pub fn validate(&self, tree: &DefinitionTree) -> Vec<ValidationError> {
        let helper = ReferenceValidatorHelper::new(tree, self.host);
        let mut errors = self.validate_parameters(tree, &helper);
        errors.extend(self.validate_services(tree, &helper));
        errors
    }

    fn validate_parameters(
        &self,
        tree: &DefinitionTree,
        helper: &ReferenceValidatorHelper<'_>,
    ) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut graph = ReferenceGraph::new();

        for (parameter, value) in &tree.parameters {
            let (mut parameter_errors, references) =
                helper.check_value_tree(value, CheckOptions::skipping_services());
            graph.add_references(parameter, references.parameters);
            add_context_to_all(&mut parameter_errors, "parameter", parameter.as_str());
            errors.extend(parameter_errors);
        }

        let cyclic = graph.nodes_reaching_cycles();
        for parameter in graph.keys() {
            if cyclic.contains(parameter) {
                errors.push(
                    ValidationError::reference(format!(
                        "A circular reference was found for the parameter '{parameter}'"
                    ))
                    .with_context("parameter", parameter),
                );
            }
        }

        errors
    }

    fn validate_services(
        &self,
        tree: &DefinitionTree,
        helper: &ReferenceValidatorHelper<'_>,
    ) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut graph = ReferenceGraph::new();
        let mut service_keys_with_references = Vec::new();

        for (service, definition) in &tree.services {
            let mut service_errors = Vec::new();
            let mut service_references: Vec<String> = Vec::new();

            self.check_class(definition, &mut service_errors);
            self.check_arguments(
                helper,
                definition,
                &mut service_errors,
                &mut service_references,
            );
            self.check_factory(tree, definition, &mut service_errors, &mut service_references);
            self.check_alias(tree, definition, &mut service_errors, &mut service_references);
            self.check_calls(
                helper,
                definition,
                &mut service_errors,
                &mut service_references,
            );

            for tag in &definition.tags {
                let (tag_errors, _) =
                    helper.check_value(&tag.tag, CheckOptions::skipping_services());
                service_errors.extend(tag_errors);
                if let Some(name) = &tag.name {
                    let (name_errors, _) =
                        helper.check_value(name, CheckOptions::skipping_services());
                    service_errors.extend(name_errors);
                }
                // tag declarations feed the combined graph from the tag side
                graph.add_references(&format!("{TAG_SIGIL}{}", tag.tag), [service.as_str()]);
            }

            if !service_references.is_empty() {
                graph.add_references(service, service_references);
                service_keys_with_references.push(service.clone());
            }

            add_context_to_all(&mut service_errors, "service", service.as_str());
            errors.extend(service_errors);
        }

        let cyclic = graph.nodes_reaching_cycles();
        for service in service_keys_with_references {
            if cyclic.contains(&service) {
                errors.push(
                    ValidationError::reference(format!(
                        "A circular reference was found for the service '{service}'"
                    ))
                    .with_context("service", service.as_str()),
                );
            }
        }

        errors
    }

    fn check_class(&self, definition: &ServiceDef, errors: &mut Vec<ValidationError>) {
        if let Some(class) = &definition.class {
            if !class.is_empty() && !self.host.class_exists(class) {
                errors.push(ValidationError::reference(format!(
                    "The class {class} does not exist"
                )));
            }
        }
    }

    fn check_arguments(
        &self,
        helper: &ReferenceValidatorHelper<'_>,
        definition: &ServiceDef,
        errors: &mut Vec<ValidationError>,
        references: &mut Vec<String>,
    ) {
        for argument in &definition.arguments {
            if let Some(name) = &argument.name {
                let (name_errors, _) =
                    helper.check_value(name, CheckOptions::skipping_services());
                errors.extend(name_errors);
            }
            let (value_errors, found) =
                helper.check_value_tree(&argument.value, CheckOptions::default());
            errors.extend(value_errors);
            references.extend(found.services);
            references.extend(found.tags);
        }
    }

    fn check_factory(
        &self,
        tree: &DefinitionTree,
        definition: &ServiceDef,
        errors: &mut Vec<ValidationError>,
        references: &mut Vec<String>,
    ) {
        let mut factory_class: Option<String> = None;
        let mut needs_static_method = false;

        if let Some(factory_service) = &definition.factory_service {
            let key = service_key(factory_service);
            match tree.services.get(key) {
                Some(target) => {
                    references.push(key.to_string());
                    factory_class = target.class.clone();
                }
                None => errors.push(ValidationError::reference(format!(
                    "The factory service '{key}' does not exist"
                ))),
            }
        }

        if let Some(class) = &definition.factory_class {
            if definition.factory_service.is_some() {
                errors.push(ValidationError::reference(
                    "Cannot use both factoryService and factoryClass directives \
                     in the same service definition",
                ));
                factory_class = None;
            } else if !self.host.class_exists(class) {
                errors.push(ValidationError::reference(format!(
                    "The factory class '{class}' does not exist"
                )));
            } else {
                factory_class = Some(class.clone());
                needs_static_method = true;
            }
        }

        let Some(factory_class) = factory_class else {
            return;
        };
        // an invalid class on the factory service is reported against that
        // definition, not this one
        if !self.host.class_exists(&factory_class) {
            return;
        }

        let Some(method) = &definition.factory_method else {
            errors.push(ValidationError::reference(
                "The factoryMethod attribute is required when using a factory",
            ));
            return;
        };
        if !self.host.method_exists(&factory_class, method) {
            errors.push(ValidationError::reference(format!(
                "The factory method '{method}' does not exist on the class '{factory_class}'"
            )));
        } else if needs_static_method && !self.host.method_is_static(&factory_class, method) {
            errors.push(ValidationError::reference(format!(
                "The factory class method '{factory_class}::{method}' is not a static method"
            )));
        }
    }

    fn check_alias(
        &self,
        tree: &DefinitionTree,
        definition: &ServiceDef,
        errors: &mut Vec<ValidationError>,
        references: &mut Vec<String>,
    ) {
        if let Some(alias_of) = &definition.alias_of {
            let key = service_key(alias_of);
            if tree.services.contains_key(key) {
                references.push(key.to_string());
            } else {
                errors.push(ValidationError::reference(format!(
                    "The alias '{key}' does not exist"
                )));
            }
        }
    }

    fn check_calls(
        &self,
        helper: &ReferenceValidatorHelper<'_>,
        definition: &ServiceDef,
        errors: &mut Vec<ValidationError>,
        references: &mut Vec<String>,
    ) {
        for call in &definition.calls {
            if let Some(class) = &definition.class {
                if !self.host.method_exists(class, &call.method) {
                    errors.push(ValidationError::reference(format!(
                        "The call method '{}' does not exist on the service class '{class}'",
                        call.method
                    )));
                }
            }
            for argument in &call.arguments {
                let (argument_errors, found) =
                    helper.check_value_tree(&argument.value, CheckOptions::default());
                errors.extend(argument_errors);
                references.extend(found.services);
                references.extend(found.tags);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phial_definitions::{Argument, CallDef, StaticHostRegistry, TagDef, Value};

    fn service(class: &str) -> ServiceDef {
        ServiceDef {
            class: Some(class.to_string()),
            ..ServiceDef::default()
        }
    }

    fn host() -> StaticHostRegistry {
        StaticHostRegistry::new()
            .with_method("App\\Mailer", "setLogger")
            .with_class("App\\Transport")
            .with_static_method("App\\Factory", "create")
            .with_method("App\\Factory", "build")
            .with_constant("App\\Json::PRETTY", 1i64)
    }

    fn validate(tree: &DefinitionTree) -> Vec<ValidationError> {
        let host = host();
        ReferenceValidator::new(&host).validate(tree)
    }

    #[test]
    fn clean_tree_passes() {
        let mut tree = DefinitionTree::default();
        tree.parameters
            .insert("host".to_string(), Value::from("localhost"));
        let mut mailer = service("App\\Mailer");
        mailer.arguments.push(Argument::positional("%host%"));
        mailer.arguments.push(Argument::positional("@transport"));
        mailer.calls.push(CallDef {
            method: "setLogger".to_string(),
            arguments: vec![Argument::positional("@transport")],
        });
        tree.services.insert("mailer".to_string(), mailer);
        tree.services
            .insert("transport".to_string(), service("App\\Transport"));

        let errors = validate(&tree);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }

    #[test]
    fn missing_class_is_reported() {
        let mut tree = DefinitionTree::default();
        tree.services.insert("svc".to_string(), service("App\\Ghost"));
        let errors = validate(&tree);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "The class App\\Ghost does not exist");
        assert_eq!(errors[0].context["service"], Value::from("svc"));
    }

    #[test]
    fn missing_parameter_in_parameter_value() {
        let mut tree = DefinitionTree::default();
        tree.parameters
            .insert("url".to_string(), Value::from("%scheme%://"));
        let errors = validate(&tree);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("'scheme'"));
        assert_eq!(errors[0].context["parameter"], Value::from("url"));
    }

    #[test]
    fn service_tokens_in_parameter_values_are_skipped() {
        let mut tree = DefinitionTree::default();
        tree.parameters
            .insert("ref".to_string(), Value::from("@not.a.service"));
        assert!(validate(&tree).is_empty());
    }

    #[test]
    fn circular_parameters_are_reported() {
        let mut tree = DefinitionTree::default();
        tree.parameters.insert("a".to_string(), Value::from("%b%"));
        tree.parameters.insert("b".to_string(), Value::from("%a%"));
        let errors = validate(&tree);
        let circular: Vec<_> = errors
            .iter()
            .filter(|e| e.message.contains("circular reference"))
            .collect();
        assert_eq!(circular.len(), 2);
    }

    #[test]
    fn factory_styles_are_mutually_exclusive() {
        let mut tree = DefinitionTree::default();
        tree.services
            .insert("factory".to_string(), service("App\\Factory"));
        let mut bad = ServiceDef {
            factory_class: Some("App\\Factory".to_string()),
            factory_service: Some("@factory".to_string()),
            factory_method: Some("create".to_string()),
            ..ServiceDef::default()
        };
        bad.class = None;
        tree.services.insert("bad".to_string(), bad);

        let errors = validate(&tree);
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .message
            .contains("Cannot use both factoryService and factoryClass"));
    }

    #[test]
    fn factory_class_method_must_be_static() {
        let mut tree = DefinitionTree::default();
        tree.services.insert(
            "bad".to_string(),
            ServiceDef {
                factory_class: Some("App\\Factory".to_string()),
                factory_method: Some("build".to_string()),
                ..ServiceDef::default()
            },
        );
        let errors = validate(&tree);
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .message
            .contains("'App\\Factory::build' is not a static method"));
    }

    #[test]
    fn factory_service_method_checked_on_target_class() {
        let mut tree = DefinitionTree::default();
        tree.services
            .insert("factory".to_string(), service("App\\Factory"));
        tree.services.insert(
            "made".to_string(),
            ServiceDef {
                factory_service: Some("@factory".to_string()),
                factory_method: Some("build".to_string()),
                ..ServiceDef::default()
            },
        );
        assert!(validate(&tree).is_empty());

        tree.services.get_mut("made").unwrap().factory_method = Some("missing".to_string());
        let errors = validate(&tree);
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .message
            .contains("The factory method 'missing' does not exist on the class 'App\\Factory'"));
    }

    #[test]
    fn missing_factory_service_is_reported() {
        let mut tree = DefinitionTree::default();
        tree.services.insert(
            "made".to_string(),
            ServiceDef {
                factory_service: Some("@ghost".to_string()),
                factory_method: Some("build".to_string()),
                ..ServiceDef::default()
            },
        );
        let errors = validate(&tree);
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .message
            .contains("The factory service 'ghost' does not exist"));
    }

    #[test]
    fn missing_alias_target_is_reported() {
        let mut tree = DefinitionTree::default();
        tree.services.insert(
            "alias".to_string(),
            ServiceDef {
                alias_of: Some("@ghost".to_string()),
                ..ServiceDef::default()
            },
        );
        let errors = validate(&tree);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "The alias 'ghost' does not exist");
    }

    #[test]
    fn missing_call_method_is_reported() {
        let mut tree = DefinitionTree::default();
        let mut mailer = service("App\\Mailer");
        mailer.calls.push(CallDef {
            method: "missing".to_string(),
            arguments: Vec::new(),
        });
        tree.services.insert("mailer".to_string(), mailer);
        let errors = validate(&tree);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains(
            "The call method 'missing' does not exist on the service class 'App\\Mailer'"
        ));
    }

    #[test]
    fn circular_services_are_reported() {
        let mut tree = DefinitionTree::default();
        let mut a = service("App\\Mailer");
        a.arguments.push(Argument::positional("@b"));
        let mut b = service("App\\Transport");
        b.arguments.push(Argument::positional("@a"));
        tree.services.insert("a".to_string(), a);
        tree.services.insert("b".to_string(), b);

        let errors = validate(&tree);
        let circular: Vec<_> = errors
            .iter()
            .filter(|e| e.message.contains("circular reference"))
            .collect();
        assert_eq!(circular.len(), 2);
    }

    #[test]
    fn cycles_through_tags_are_detected() {
        // "collector" consumes the '#handlers' collection; "handler" is
        // tagged into it and refers back to the collector.
        let mut tree = DefinitionTree::default();
        let mut collector = service("App\\Mailer");
        collector.arguments.push(Argument::positional("#handlers"));
        tree.services.insert("collector".to_string(), collector);

        let mut handler = service("App\\Transport");
        handler.arguments.push(Argument::positional("@collector"));
        handler.tags.push(TagDef::bare("handlers"));
        tree.services.insert("handler".to_string(), handler);

        let errors = validate(&tree);
        let circular: Vec<_> = errors
            .iter()
            .filter(|e| e.message.contains("circular reference"))
            .collect();
        assert_eq!(circular.len(), 2, "errors: {errors:?}");
    }

    #[test]
    fn absent_tag_reference_is_not_an_error() {
        let mut tree = DefinitionTree::default();
        let mut collector = service("App\\Mailer");
        collector.arguments.push(Argument::positional("#nobody"));
        tree.services.insert("collector".to_string(), collector);
        assert!(validate(&tree).is_empty());
    }

    #[test]
    fn tag_names_are_not_service_references() {
        let mut tree = DefinitionTree::default();
        let mut svc = service("App\\Mailer");
        svc.tags.push(TagDef {
            tag: "@odd.tag".to_string(),
            name: None,
            order: None,
        });
        tree.services.insert("svc".to_string(), svc);
        assert!(validate(&tree).is_empty());
    }

    #[test]
    fn errors_accumulate_across_services() {
        let mut tree = DefinitionTree::default();
        tree.services.insert("one".to_string(), service("App\\Ghost"));
        tree.services.insert("two".to_string(), service("App\\AlsoGhost"));
        let errors = validate(&tree);
        assert_eq!(errors.len(), 2);
    }
}
