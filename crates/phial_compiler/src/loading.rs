//! Locating and parsing config files, including `imports` handling.

use crate::error::CompileError;
use phial_definitions::{deep_replace, Value};
use phial_diagnostics::ValidationError;
use phial_loader::{ConfigLocator, LoaderRegistry};
use phial_validate::SyntaxValidator;
use std::path::{Path, PathBuf};

/// Loads definition files through the loader registry and locator, pulling
/// in `imports` depth-first.
pub struct ConfigLoader {
    registry: LoaderRegistry,
    locator: ConfigLocator,
}

impl ConfigLoader {
    /// Creates a loader from a registry and a locator.
    pub fn new(registry: LoaderRegistry, locator: ConfigLocator) -> Self {
        Self { registry, locator }
    }

    /// Creates a loader with the default format loaders over the given
    /// search directories.
    pub fn with_search_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self::new(
            LoaderRegistry::with_defaults(),
            ConfigLocator::with_paths(paths),
        )
    }

    /// Locates and parses one file, without touching its imports.
    pub fn load_config(
        &self,
        file: &str,
        relative_to: Option<&Path>,
    ) -> Result<(Value, PathBuf), CompileError> {
        let path = self.locator.locate(file, relative_to)?;
        let loader = self.registry.find_loader(&path)?;
        let document = loader.load_file(&path)?;
        Ok((document, path))
    }

    /// Loads a file and everything it imports.
    ///
    /// Imports resolve relative to their importer and are processed
    /// depth-first before the importer's own document is validated; the
    /// importing file's keys win over imported ones. An import cycle is
    /// reported as a normalisation error and the repeated file is skipped.
    pub fn load_definitions(
        &self,
        file: &str,
        relative_to: Option<&Path>,
        syntax: &SyntaxValidator,
    ) -> Result<(Value, Vec<ValidationError>), CompileError> {
        self.load_definitions_inner(file, relative_to, syntax, &mut Vec::new())
    }

    fn load_definitions_inner(
        &self,
        file: &str,
        relative_to: Option<&Path>,
        syntax: &SyntaxValidator,
        visited: &mut Vec<PathBuf>,
    ) -> Result<(Value, Vec<ValidationError>), CompileError> {
        let (mut document, path) = self.load_config(file, relative_to)?;
        let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
        if visited.contains(&canonical) {
            let error = ValidationError::normalisation(format!(
                "The config file '{file}' is imported in a cycle"
            ))
            .with_context("file", path.display().to_string());
            return Ok((Value::Map(Default::default()), vec![error]));
        }
        visited.push(canonical);

        let imports: Vec<String> = document
            .as_map()
            .and_then(|map| map.get("imports"))
            .and_then(Value::as_sequence)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let mut errors = Vec::new();
        let mut imported_documents = Vec::new();
        for import in &imports {
            let (import_document, import_errors) =
                self.load_definitions_inner(import, Some(&path), syntax, visited)?;
            errors.extend(import_errors);
            imported_documents.push(import_document);
        }

        // the importer's own (raw) document is validated after its imports
        errors.extend(syntax.validate_file(&document, &path.display().to_string()));

        for imported in imported_documents {
            document = deep_replace(&imported, &document);
        }
        if let Some(map) = document.as_map_mut() {
            map.shift_remove("imports");
        }

        visited.pop();
        Ok((document, errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn loader_for(dir: &Path) -> ConfigLoader {
        ConfigLoader::with_search_paths([dir.to_path_buf()])
    }

    #[test]
    fn loads_a_single_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.yml"), "parameters:\n  a: 1\n").unwrap();

        let loader = loader_for(dir.path());
        let syntax = SyntaxValidator::with_builtin_schemas();
        let (document, errors) = loader
            .load_definitions("app.yml", None, &syntax)
            .unwrap();
        assert!(errors.is_empty());
        assert_eq!(
            document.as_map().unwrap()["parameters"].as_map().unwrap()["a"],
            Value::Int(1)
        );
    }

    #[test]
    fn importer_keys_win_over_imported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("base.yml"),
            "parameters:\n  a: base\n  b: base\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("app.yml"),
            "imports:\n  - base.yml\nparameters:\n  a: app\n",
        )
        .unwrap();

        let loader = loader_for(dir.path());
        let syntax = SyntaxValidator::with_builtin_schemas();
        let (document, errors) = loader
            .load_definitions("app.yml", None, &syntax)
            .unwrap();
        assert!(errors.is_empty());
        let parameters = document.as_map().unwrap()["parameters"].as_map().unwrap();
        assert_eq!(parameters["a"], Value::from("app"));
        assert_eq!(parameters["b"], Value::from("base"));
        assert!(!document.as_map().unwrap().contains_key("imports"));
    }

    #[test]
    fn imports_resolve_relative_to_the_importer() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/base.yml"), "parameters:\n  a: 1\n").unwrap();
        fs::write(
            dir.path().join("sub/app.yml"),
            "imports:\n  - base.yml\n",
        )
        .unwrap();

        let loader = loader_for(dir.path());
        let syntax = SyntaxValidator::with_builtin_schemas();
        let (document, errors) = loader
            .load_definitions("sub/app.yml", None, &syntax)
            .unwrap();
        assert!(errors.is_empty());
        assert_eq!(
            document.as_map().unwrap()["parameters"].as_map().unwrap()["a"],
            Value::Int(1)
        );
    }

    #[test]
    fn earlier_imports_win_over_later_ones() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("first.yml"), "parameters:\n  a: first\n").unwrap();
        fs::write(dir.path().join("second.yml"), "parameters:\n  a: second\n").unwrap();
        fs::write(
            dir.path().join("app.yml"),
            "imports:\n  - first.yml\n  - second.yml\n",
        )
        .unwrap();

        let loader = loader_for(dir.path());
        let syntax = SyntaxValidator::with_builtin_schemas();
        let (document, _) = loader
            .load_definitions("app.yml", None, &syntax)
            .unwrap();
        assert_eq!(
            document.as_map().unwrap()["parameters"].as_map().unwrap()["a"],
            Value::from("first")
        );
    }

    #[test]
    fn import_cycles_are_detected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.yml"), "imports:\n  - b.yml\n").unwrap();
        fs::write(dir.path().join("b.yml"), "imports:\n  - a.yml\n").unwrap();

        let loader = loader_for(dir.path());
        let syntax = SyntaxValidator::with_builtin_schemas();
        let (_, errors) = loader.load_definitions("a.yml", None, &syntax).unwrap();
        assert!(errors
            .iter()
            .any(|error| error.message.contains("imported in a cycle")));
    }

    #[test]
    fn diamond_imports_are_not_cycles() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("shared.yml"), "parameters:\n  a: 1\n").unwrap();
        fs::write(dir.path().join("left.yml"), "imports: [shared.yml]\n").unwrap();
        fs::write(dir.path().join("right.yml"), "imports: [shared.yml]\n").unwrap();
        fs::write(
            dir.path().join("app.yml"),
            "imports: [left.yml, right.yml]\n",
        )
        .unwrap();

        let loader = loader_for(dir.path());
        let syntax = SyntaxValidator::with_builtin_schemas();
        let (document, errors) = loader
            .load_definitions("app.yml", None, &syntax)
            .unwrap();
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        assert_eq!(
            document.as_map().unwrap()["parameters"].as_map().unwrap()["a"],
            Value::Int(1)
        );
    }

    #[test]
    fn syntax_errors_accumulate_per_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.yml"), "unexpected: true\n").unwrap();
        fs::write(
            dir.path().join("app.yml"),
            "imports:\n  - bad.yml\nunknown: 1\n",
        )
        .unwrap();

        let loader = loader_for(dir.path());
        let syntax = SyntaxValidator::with_builtin_schemas();
        let (_, errors) = loader.load_definitions("app.yml", None, &syntax).unwrap();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn missing_file_is_a_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader_for(dir.path());
        let syntax = SyntaxValidator::with_builtin_schemas();
        let err = loader
            .load_definitions("ghost.yml", None, &syntax)
            .unwrap_err();
        assert!(matches!(err, CompileError::Locator(_)));
    }
}
