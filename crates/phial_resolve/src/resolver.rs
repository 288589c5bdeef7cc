//! Token resolution against a live registry.

use crate::error::ResolveError;
use crate::registry::{Resolved, ServiceRegistry};
use indexmap::IndexMap;
use phial_common::{
    add_namespace_to_key, find_next_parameter, is_service_reference, is_tag_reference,
    replace_parameter_reference, service_key, CONSTANT_SIGIL, NAMESPACE_SEPARATOR,
};
use phial_definitions::{HostRegistry, Value};
use std::collections::{HashMap, HashSet};

/// Upper bound on substitutions within one string value; the safety net
/// for cycles the static validator could not see.
const MAX_SUBSTITUTIONS: usize = 100;

/// Resolves embedded reference tokens during object construction.
///
/// The resolver carries only registry-shaped lookup tables (registered
/// aliases and the private-service key map); the replaced-token tracking
/// used for circular detection is local to each string resolution, so one
/// resolver may be shared freely across threads.
pub struct ReferenceResolver<'h> {
    host: &'h dyn HostRegistry,
    registered_aliases: HashSet<String>,
    private_services: HashMap<String, String>,
}

impl<'h> ReferenceResolver<'h> {
    /// Creates a resolver over a host capability.
    pub fn new(host: &'h dyn HostRegistry) -> Self {
        Self {
            host,
            registered_aliases: HashSet::new(),
            private_services: HashMap::new(),
        }
    }

    /// Declares the set of registered alias prefixes.
    pub fn set_registered_aliases<I, S>(&mut self, aliases: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registered_aliases = aliases.into_iter().map(Into::into).collect();
    }

    /// Maps a private service's actual name to the opaque key it is
    /// registered under.
    pub fn register_private_service(
        &mut self,
        actual_name: impl Into<String>,
        registry_key: impl Into<String>,
    ) {
        self.private_services
            .insert(actual_name.into(), registry_key.into());
    }

    /// Resolves a service token into a live instance.
    ///
    /// Lookup order: the alias-qualified name, the bare name, then — only
    /// when an alias is supplied — the private-service table. Anything that
    /// is not a service token passes through unchanged.
    pub fn resolve_service<R: ServiceRegistry>(
        &self,
        argument: &Value,
        registry: &R,
        alias: &str,
    ) -> Result<Resolved<R::Instance>, ResolveError> {
        let Some(token) = argument.as_str().filter(|s| is_service_reference(s)) else {
            return Ok(Resolved::Value(argument.clone()));
        };

        let original = service_key(token);
        let mut name = alias_key(original, alias);
        if !registry.has(&name) {
            name = original.to_string();

            if !registry.has(&name) {
                let mut private_name = original.to_string();
                if !alias.is_empty() && !original.contains(alias) {
                    private_name = alias_key(original, alias);
                }

                let private_key = if alias.is_empty() {
                    None
                } else {
                    self.private_services
                        .get(&private_name)
                        .filter(|key| registry.has(key))
                };
                match private_key {
                    Some(key) => name = key.clone(),
                    None => return Err(ResolveError::MissingService(name)),
                }
            }
        }

        registry
            .instance(&name)
            .map(Resolved::Instance)
            .ok_or(ResolveError::MissingService(name))
    }

    /// Resolves every embedded parameter token in a value, then any
    /// constant token left over.
    ///
    /// A token spanning the whole string is replaced by the parameter's
    /// native value; an embedded token is string-substituted and scanning
    /// continues, bounded by [`MAX_SUBSTITUTIONS`]. The replaced-token set
    /// is scoped to each string value and cleared once it completes.
    pub fn resolve_parameter<R: ServiceRegistry>(
        &self,
        argument: &Value,
        registry: &R,
        alias: &str,
    ) -> Result<Value, ResolveError> {
        match argument {
            Value::Map(entries) => {
                let mut resolved = IndexMap::new();
                for (key, value) in entries {
                    let resolved_key =
                        match self.resolve_parameter(&Value::from(key.as_str()), registry, alias)? {
                            Value::String(s) => s,
                            _ => key.clone(),
                        };
                    resolved.insert(resolved_key, self.resolve_parameter(value, registry, alias)?);
                }
                Ok(Value::Map(resolved))
            }
            Value::Sequence(items) => Ok(Value::Sequence(
                items
                    .iter()
                    .map(|item| self.resolve_parameter(item, registry, alias))
                    .collect::<Result<_, _>>()?,
            )),
            Value::String(string) => self.resolve_string(string, registry, alias),
            other => Ok(other.clone()),
        }
    }

    fn resolve_string<R: ServiceRegistry>(
        &self,
        string: &str,
        registry: &R,
        alias: &str,
    ) -> Result<Value, ResolveError> {
        let mut current = Value::from(string);
        let mut replaced: HashSet<String> = HashSet::new();
        let mut iterations = 0;

        loop {
            let Some(text) = current.as_str().map(str::to_string) else {
                break;
            };
            let Some(parameter) = find_next_parameter(&text, 0).map(str::to_string) else {
                break;
            };
            if iterations >= MAX_SUBSTITUTIONS {
                return Err(ResolveError::IterationLimitExceeded(text));
            }
            iterations += 1;

            let mut name = alias_key(&parameter, alias);
            if replaced.contains(&name)
                || (self.key_is_aliased(&parameter) && !registry.has(&name))
            {
                if replaced.contains(&parameter) {
                    return Err(ResolveError::CircularReference(parameter));
                }
                name = parameter.clone();
            }
            if !registry.has(&name) {
                return Err(ResolveError::MissingParameter(name));
            }
            let value = registry
                .parameter(&name)
                .ok_or_else(|| ResolveError::MissingParameter(name.clone()))?;

            if text.len() > parameter.len() + 2 {
                // embedded token: substitute into the string and keep going
                let rendered = value
                    .scalar_to_string()
                    .ok_or_else(|| ResolveError::NonScalarSubstitution(name.clone()))?;
                current = Value::String(replace_parameter_reference(
                    &text, &parameter, &rendered, true,
                ));
            } else {
                // the token is the whole string: take the native value
                current = value;
            }
            replaced.insert(name);
        }

        self.resolve_constant(current)
    }

    /// Constant tokens are only considered once every parameter token in
    /// the value is gone.
    fn resolve_constant(&self, value: Value) -> Result<Value, ResolveError> {
        let Some(text) = value.as_str() else {
            return Ok(value);
        };
        if text.len() < 2
            || !text.starts_with(CONSTANT_SIGIL)
            || !text.ends_with(CONSTANT_SIGIL)
        {
            return Ok(value);
        }

        let constant = &text[1..text.len() - 1];
        if let Some((class_name, _)) = constant.split_once("::") {
            if !self.host.class_exists(class_name) && !self.host.interface_exists(class_name) {
                return Err(ResolveError::MissingClass(class_name.to_string()));
            }
        }
        match self.host.constant_value(constant) {
            Some(resolved) => Ok(resolved),
            None => Err(ResolveError::MissingConstant(constant.to_string())),
        }
    }

    /// Resolves a tag token into the instances of every tagged service.
    ///
    /// An absent tag yields an empty collection, not an error; the key
    /// scheme of the collection (names and integer order) is preserved.
    pub fn resolve_tag<R: ServiceRegistry>(
        &self,
        argument: &Value,
        registry: &R,
    ) -> Result<Resolved<R::Instance>, ResolveError> {
        let Some(token) = argument.as_str().filter(|s| is_tag_reference(s)) else {
            return Ok(Resolved::Value(argument.clone()));
        };

        let Some(collection) = registry.tag_collection(token) else {
            return Ok(Resolved::Collection(IndexMap::new()));
        };

        let mut members = IndexMap::new();
        for (key, service_name) in collection.services() {
            let instance = registry
                .instance(service_name)
                .ok_or_else(|| ResolveError::MissingService(service_name.to_string()))?;
            members.insert(key.clone(), instance);
        }
        Ok(Resolved::Collection(members))
    }

    fn key_is_aliased(&self, key: &str) -> bool {
        match key.split_once(NAMESPACE_SEPARATOR) {
            Some((prefix, _)) => self.registered_aliases.contains(prefix),
            None => false,
        }
    }
}

fn alias_key(key: &str, alias: &str) -> String {
    add_namespace_to_key(alias, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use phial_definitions::{StaticHostRegistry, TagCollection, TagKey};

    /// A minimal in-memory registry: string-identified instances.
    #[derive(Default)]
    struct TestRegistry {
        parameters: IndexMap<String, Value>,
        instances: IndexMap<String, String>,
        collections: IndexMap<String, TagCollection>,
    }

    impl TestRegistry {
        fn with_parameter(mut self, key: &str, value: impl Into<Value>) -> Self {
            self.parameters.insert(key.to_string(), value.into());
            self
        }

        fn with_instance(mut self, key: &str, instance: &str) -> Self {
            self.instances.insert(key.to_string(), instance.to_string());
            self
        }

        fn with_collection(mut self, token: &str, collection: TagCollection) -> Self {
            self.collections.insert(token.to_string(), collection);
            self
        }
    }

    impl ServiceRegistry for TestRegistry {
        type Instance = String;

        fn has(&self, key: &str) -> bool {
            self.parameters.contains_key(key) || self.instances.contains_key(key)
        }

        fn parameter(&self, key: &str) -> Option<Value> {
            self.parameters.get(key).cloned()
        }

        fn instance(&self, key: &str) -> Option<String> {
            self.instances.get(key).cloned()
        }

        fn tag_collection(&self, key: &str) -> Option<&TagCollection> {
            self.collections.get(key)
        }
    }

    fn host() -> StaticHostRegistry {
        StaticHostRegistry::new()
            .with_class("App\\Json")
            .with_constant("App\\Json::PRETTY", 128i64)
            .with_constant("STANDALONE", "value")
    }

    #[test]
    fn non_service_values_pass_through() {
        let host = host();
        let resolver = ReferenceResolver::new(&host);
        let registry = TestRegistry::default();
        let result = resolver
            .resolve_service(&Value::from("plain"), &registry, "")
            .unwrap();
        assert_eq!(result, Resolved::Value(Value::from("plain")));
    }

    #[test]
    fn resolves_bare_service() {
        let host = host();
        let resolver = ReferenceResolver::new(&host);
        let registry = TestRegistry::default().with_instance("mailer", "mailer-instance");
        let result = resolver
            .resolve_service(&Value::from("@mailer"), &registry, "")
            .unwrap();
        assert_eq!(result.as_instance().map(String::as_str), Some("mailer-instance"));
    }

    #[test]
    fn alias_qualified_name_wins_over_bare() {
        let host = host();
        let resolver = ReferenceResolver::new(&host);
        let registry = TestRegistry::default()
            .with_instance("ns.mailer", "namespaced")
            .with_instance("mailer", "bare");
        let result = resolver
            .resolve_service(&Value::from("@mailer"), &registry, "ns")
            .unwrap();
        assert_eq!(result.as_instance().map(String::as_str), Some("namespaced"));
    }

    #[test]
    fn falls_back_to_bare_name() {
        let host = host();
        let resolver = ReferenceResolver::new(&host);
        let registry = TestRegistry::default().with_instance("mailer", "bare");
        let result = resolver
            .resolve_service(&Value::from("@mailer"), &registry, "ns")
            .unwrap();
        assert_eq!(result.as_instance().map(String::as_str), Some("bare"));
    }

    #[test]
    fn missing_service_errors() {
        let host = host();
        let resolver = ReferenceResolver::new(&host);
        let registry = TestRegistry::default();
        let err = resolver
            .resolve_service(&Value::from("@ghost"), &registry, "")
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingService(name) if name == "ghost"));
    }

    #[test]
    fn private_service_requires_alias() {
        let host = host();
        let mut resolver = ReferenceResolver::new(&host);
        let opaque = phial_common::private_service_key("ns.priv");
        resolver.register_private_service("ns.priv", opaque.clone());
        let registry = TestRegistry::default().with_instance(&opaque, "private-instance");

        // no alias: always fails
        let err = resolver
            .resolve_service(&Value::from("@priv"), &registry, "")
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingService(_)));

        // the owning alias reaches the opaque key
        let result = resolver
            .resolve_service(&Value::from("@priv"), &registry, "ns")
            .unwrap();
        assert_eq!(
            result.as_instance().map(String::as_str),
            Some("private-instance")
        );

        // a different alias is not privately registered for this name
        let err = resolver
            .resolve_service(&Value::from("@priv"), &registry, "other")
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingService(_)));
    }

    #[test]
    fn whole_token_takes_native_value() {
        let host = host();
        let resolver = ReferenceResolver::new(&host);
        let registry =
            TestRegistry::default().with_parameter("flags", Value::Sequence(vec![Value::Int(1)]));
        let resolved = resolver
            .resolve_parameter(&Value::from("%flags%"), &registry, "")
            .unwrap();
        assert_eq!(resolved, Value::Sequence(vec![Value::Int(1)]));
    }

    #[test]
    fn embedded_token_is_substituted() {
        let host = host();
        let resolver = ReferenceResolver::new(&host);
        let registry = TestRegistry::default()
            .with_parameter("host", "localhost")
            .with_parameter("port", 8080i64);
        let resolved = resolver
            .resolve_parameter(&Value::from("%host%:%port%"), &registry, "")
            .unwrap();
        assert_eq!(resolved, Value::from("localhost:8080"));
    }

    #[test]
    fn chained_parameters_resolve() {
        let host = host();
        let resolver = ReferenceResolver::new(&host);
        let registry = TestRegistry::default()
            .with_parameter("url", "%host%/api")
            .with_parameter("host", "localhost");
        let resolved = resolver
            .resolve_parameter(&Value::from("%url%"), &registry, "")
            .unwrap();
        assert_eq!(resolved, Value::from("localhost/api"));
    }

    #[test]
    fn alias_qualified_parameter_wins() {
        let host = host();
        let resolver = ReferenceResolver::new(&host);
        let registry = TestRegistry::default()
            .with_parameter("ns.host", "namespaced")
            .with_parameter("host", "bare");
        let resolved = resolver
            .resolve_parameter(&Value::from("%host%"), &registry, "ns")
            .unwrap();
        assert_eq!(resolved, Value::from("namespaced"));
    }

    #[test]
    fn missing_parameter_errors() {
        let host = host();
        let resolver = ReferenceResolver::new(&host);
        let registry = TestRegistry::default();
        let err = resolver
            .resolve_parameter(&Value::from("%ghost%"), &registry, "")
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingParameter(name) if name == "ghost"));
    }

    #[test]
    fn self_referencing_chain_is_circular() {
        // p = "%x% %y%", x = "1", y = "%x%": substituting y re-introduces
        // x, which was already replaced in this value.
        let host = host();
        let resolver = ReferenceResolver::new(&host);
        let registry = TestRegistry::default()
            .with_parameter("x", "1")
            .with_parameter("y", "%x%");
        let err = resolver
            .resolve_parameter(&Value::from("%x% %y%"), &registry, "")
            .unwrap_err();
        assert!(matches!(err, ResolveError::CircularReference(key) if key == "x"));
    }

    #[test]
    fn direct_cycle_hits_the_iteration_bound() {
        let host = host();
        let resolver = ReferenceResolver::new(&host);
        let registry = TestRegistry::default()
            .with_parameter("a", "%b% tail")
            .with_parameter("b", "%a% tail");
        let err = resolver
            .resolve_parameter(&Value::from("start %a%"), &registry, "")
            .unwrap_err();
        // either detection is acceptable, but it must terminate
        assert!(matches!(
            err,
            ResolveError::CircularReference(_) | ResolveError::IterationLimitExceeded(_)
        ));
    }

    #[test]
    fn replaced_set_is_cleared_between_values() {
        let host = host();
        let resolver = ReferenceResolver::new(&host);
        let registry = TestRegistry::default().with_parameter("x", "1");
        for _ in 0..3 {
            let resolved = resolver
                .resolve_parameter(&Value::from("x=%x%"), &registry, "")
                .unwrap();
            assert_eq!(resolved, Value::from("x=1"));
        }
    }

    #[test]
    fn containers_resolve_elementwise() {
        let host = host();
        let resolver = ReferenceResolver::new(&host);
        let registry = TestRegistry::default().with_parameter("host", "localhost");
        let mut map = IndexMap::new();
        map.insert("url".to_string(), Value::from("%host%/api"));
        let argument = Value::Sequence(vec![Value::Map(map)]);

        let resolved = resolver.resolve_parameter(&argument, &registry, "").unwrap();
        let inner = resolved.as_sequence().unwrap()[0].as_map().unwrap();
        assert_eq!(inner["url"], Value::from("localhost/api"));
    }

    #[test]
    fn constants_resolve_after_parameters() {
        let host = host();
        let resolver = ReferenceResolver::new(&host);
        let registry = TestRegistry::default().with_parameter("flag", "^App\\Json::PRETTY^");
        let resolved = resolver
            .resolve_parameter(&Value::from("%flag%"), &registry, "")
            .unwrap();
        assert_eq!(resolved, Value::Int(128));
    }

    #[test]
    fn unqualified_constant_resolves() {
        let host = host();
        let resolver = ReferenceResolver::new(&host);
        let registry = TestRegistry::default();
        let resolved = resolver
            .resolve_parameter(&Value::from("^STANDALONE^"), &registry, "")
            .unwrap();
        assert_eq!(resolved, Value::from("value"));
    }

    #[test]
    fn constant_with_missing_class_errors() {
        let host = host();
        let resolver = ReferenceResolver::new(&host);
        let registry = TestRegistry::default();
        let err = resolver
            .resolve_parameter(&Value::from("^App\\Ghost::X^"), &registry, "")
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingClass(class) if class == "App\\Ghost"));
    }

    #[test]
    fn missing_constant_errors() {
        let host = host();
        let resolver = ReferenceResolver::new(&host);
        let registry = TestRegistry::default();
        let err = resolver
            .resolve_parameter(&Value::from("^App\\Json::COMPACT^"), &registry, "")
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingConstant(_)));
    }

    #[test]
    fn absent_tag_resolves_to_empty_collection() {
        let host = host();
        let resolver = ReferenceResolver::new(&host);
        let registry = TestRegistry::default();
        let result = resolver
            .resolve_tag(&Value::from("#nobody"), &registry)
            .unwrap();
        assert_eq!(result, Resolved::Collection(IndexMap::new()));
    }

    #[test]
    fn tag_members_resolve_preserving_keys() {
        let host = host();
        let resolver = ReferenceResolver::new(&host);
        let mut collection = TagCollection::new();
        collection.add_service("first", None);
        collection.add_service("named", Some(TagKey::Name("primary".to_string())));
        let registry = TestRegistry::default()
            .with_instance("first", "first-instance")
            .with_instance("named", "named-instance")
            .with_collection("#handlers", collection);

        let result = resolver
            .resolve_tag(&Value::from("#handlers"), &registry)
            .unwrap();
        let Resolved::Collection(members) = result else {
            panic!("expected a collection");
        };
        assert_eq!(members[&TagKey::Index(0)], "first-instance");
        assert_eq!(members[&TagKey::Name("primary".to_string())], "named-instance");
    }

    #[test]
    fn non_tag_values_pass_through_resolve_tag() {
        let host = host();
        let resolver = ReferenceResolver::new(&host);
        let registry = TestRegistry::default();
        let result = resolver
            .resolve_tag(&Value::from("plain"), &registry)
            .unwrap();
        assert_eq!(result, Resolved::Value(Value::from("plain")));
    }
}
