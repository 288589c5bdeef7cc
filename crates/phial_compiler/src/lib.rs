//! The compile pipeline: load → syntax-validate → normalize →
//! reference-validate, with error accumulation and phase-boundary aborts.
//!
//! Each phase accumulates [`ValidationError`]s instead of failing fast; a
//! phase boundary aborts the *next* phase if the previous one left any
//! error standing (after the `ignore_warnings` filter), so one run reports
//! as many real problems as possible without cascading nonsense.

#![warn(missing_docs)]

pub mod error;
pub mod loading;

pub use error::CompileError;
pub use loading::ConfigLoader;

use indexmap::IndexMap;
use phial_definitions::{deep_replace, DefinitionTree, HostRegistry, Value};
use phial_diagnostics::{ErrorSink, ValidationError};
use phial_validate::{ReferenceValidator, SyntaxValidator};
use std::sync::Arc;

/// One input file with its namespace assignment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigFile {
    /// The file to load (bare name or relative path).
    pub file: String,
    /// The namespace its definitions belong to; empty for the root.
    pub namespace: String,
}

impl ConfigFile {
    /// A file assigned to the root namespace.
    pub fn root(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            namespace: String::new(),
        }
    }

    /// A file assigned to a named namespace.
    pub fn namespaced(file: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            namespace: namespace.into(),
        }
    }
}

/// Options recognised by [`ConfigCompiler::compile`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CompileOptions {
    /// Drop warning-kind errors before each abort decision.
    pub ignore_warnings: bool,
}

/// The compiled output: a flat definition tree plus the namespace order.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledConfig {
    /// The fully normalized, validated definition tree.
    pub definitions: DefinitionTree,
    /// Namespaces in the order they were supplied.
    pub namespaces: Vec<String>,
}

/// Drives the whole compilation pipeline.
pub struct ConfigCompiler<'h> {
    loader: ConfigLoader,
    syntax: SyntaxValidator,
    host: &'h dyn HostRegistry,
    error_sink: Option<Arc<ErrorSink>>,
}

impl<'h> ConfigCompiler<'h> {
    /// Creates a compiler from its collaborators.
    pub fn new(loader: ConfigLoader, syntax: SyntaxValidator, host: &'h dyn HostRegistry) -> Self {
        Self {
            loader,
            syntax,
            host,
            error_sink: None,
        }
    }

    /// Attaches an error sink that receives every error behind an abort.
    pub fn with_error_sink(mut self, sink: Arc<ErrorSink>) -> Self {
        self.error_sink = Some(sink);
        self
    }

    /// Compiles the given files into one definition tree.
    pub fn compile(
        &self,
        files: &[ConfigFile],
        options: &CompileOptions,
    ) -> Result<CompiledConfig, CompileError> {
        let mut errors = Vec::new();
        let mut documents: IndexMap<String, Value> = IndexMap::new();

        for config_file in files {
            let (document, file_errors) =
                self.loader
                    .load_definitions(&config_file.file, None, &self.syntax)?;
            errors.extend(file_errors);
            let merged = match documents.get(&config_file.namespace) {
                Some(existing) => deep_replace(existing, &document),
                None => document,
            };
            documents.insert(config_file.namespace.clone(), merged);
        }
        self.report_errors(errors, options)?;

        let namespaces: Vec<String> = documents.keys().cloned().collect();

        let (definitions, errors) = phial_normalise::normalise(documents);
        self.report_errors(errors, options)?;

        let errors = ReferenceValidator::new(self.host).validate(&definitions);
        self.report_errors(errors, options)?;

        Ok(CompiledConfig {
            definitions,
            namespaces,
        })
    }

    /// The abort policy at each phase boundary.
    ///
    /// A single remaining error surfaces verbatim with its context; several
    /// surface only as a count, with the detail going to the error sink.
    fn report_errors(
        &self,
        errors: Vec<ValidationError>,
        options: &CompileOptions,
    ) -> Result<(), CompileError> {
        if errors.is_empty() {
            return Ok(());
        }
        let errors: Vec<ValidationError> = if options.ignore_warnings {
            errors.into_iter().filter(|e| !e.is_warning()).collect()
        } else {
            errors
        };
        if errors.is_empty() {
            return Ok(());
        }

        if let Some(sink) = &self.error_sink {
            sink.emit_all(errors.iter().cloned());
        }

        let message = if errors.len() == 1 {
            format!("Error: {} {}", errors[0].message, errors[0].context_json())
        } else {
            format!(
                "There were {} validation errors. See the error log for more details",
                errors.len()
            )
        };
        Err(CompileError::Validation(message))
    }
}
