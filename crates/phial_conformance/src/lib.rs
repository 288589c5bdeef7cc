//! Conformance test helpers for the phial pipeline.
//!
//! Provides a fixture type that writes definition files into a temp
//! directory and compiles them, plus a minimal container that registers
//! compiled services as string-identified instances so the runtime
//! resolver can be exercised end to end.

#![warn(missing_docs)]

use indexmap::IndexMap;
use phial_common::{private_service_key, service_key};
use phial_compiler::{CompileError, CompileOptions, CompiledConfig, ConfigCompiler, ConfigFile, ConfigLoader};
use phial_definitions::{
    build_tag_collections, HostRegistry, StaticHostRegistry, TagCollection, Value,
};
use phial_resolve::{ReferenceResolver, ServiceRegistry};
use phial_validate::SyntaxValidator;
use tempfile::TempDir;

/// A temp directory of definition files ready to compile.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// Writes each `(name, contents)` pair into a fresh temp directory.
    pub fn new(files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().expect("create fixture directory");
        for (name, contents) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("create fixture subdirectory");
            }
            std::fs::write(path, contents).expect("write fixture file");
        }
        Self { dir }
    }

    /// Compiles `(file, namespace)` assignments against the given host.
    pub fn compile(
        &self,
        assignments: &[(&str, &str)],
        host: &dyn HostRegistry,
    ) -> Result<CompiledConfig, CompileError> {
        self.compile_with_options(assignments, host, &CompileOptions::default())
    }

    /// Compiles with explicit options.
    pub fn compile_with_options(
        &self,
        assignments: &[(&str, &str)],
        host: &dyn HostRegistry,
        options: &CompileOptions,
    ) -> Result<CompiledConfig, CompileError> {
        let loader = ConfigLoader::with_search_paths([self.dir.path().to_path_buf()]);
        let compiler = ConfigCompiler::new(loader, SyntaxValidator::with_builtin_schemas(), host);
        let files: Vec<ConfigFile> = assignments
            .iter()
            .map(|(file, namespace)| ConfigFile::namespaced(*file, *namespace))
            .collect();
        compiler.compile(&files, options)
    }
}

/// A host registry declaring the given classes (no methods or constants).
pub fn host_with_classes(classes: &[&str]) -> StaticHostRegistry {
    let mut host = StaticHostRegistry::new();
    for class in classes {
        host = host.with_class(*class);
    }
    host
}

/// A minimal container over a compiled tree.
///
/// Each non-alias service is registered as the string `instance:<key>`;
/// private services are registered under their opaque key; aliases map to
/// their target's instance; tag collections are built from the tree.
pub struct TestContainer {
    parameters: IndexMap<String, Value>,
    instances: IndexMap<String, String>,
    collections: IndexMap<String, TagCollection>,
    private_services: Vec<(String, String)>,
    namespaces: Vec<String>,
}

impl TestContainer {
    /// Builds a container from a compiled configuration.
    pub fn build(compiled: &CompiledConfig) -> Self {
        let tree = &compiled.definitions;
        let mut instances: IndexMap<String, String> = IndexMap::new();
        let mut private_services = Vec::new();

        for (key, definition) in &tree.services {
            if definition.is_alias() {
                continue;
            }
            let registered_key = if definition.private {
                let opaque = private_service_key(key);
                private_services.push((key.clone(), opaque.clone()));
                opaque
            } else {
                key.clone()
            };
            instances.insert(registered_key, format!("instance:{key}"));
        }

        // aliases may chain; iterate until no more resolve
        loop {
            let mut progressed = false;
            for (key, definition) in &tree.services {
                let Some(alias_of) = &definition.alias_of else {
                    continue;
                };
                if instances.contains_key(key) {
                    continue;
                }
                let target = service_key(alias_of).to_string();
                if let Some(instance) = instances.get(&target).cloned() {
                    instances.insert(key.clone(), instance);
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }

        Self {
            parameters: tree.parameters.clone(),
            instances,
            collections: build_tag_collections(tree),
            private_services,
            namespaces: compiled.namespaces.clone(),
        }
    }

    /// A resolver configured with this container's aliases and private
    /// services.
    pub fn resolver<'h>(&self, host: &'h dyn HostRegistry) -> ReferenceResolver<'h> {
        let mut resolver = ReferenceResolver::new(host);
        resolver.set_registered_aliases(
            self.namespaces
                .iter()
                .filter(|ns| !ns.is_empty())
                .cloned(),
        );
        for (actual, opaque) in &self.private_services {
            resolver.register_private_service(actual.clone(), opaque.clone());
        }
        resolver
    }
}

impl ServiceRegistry for TestContainer {
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
