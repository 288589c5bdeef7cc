//! Static validation: document shape against declarative schemas, the
//! schemas themselves against the directive vocabulary, and whole-graph
//! reference checking over a compiled tree.

#![warn(missing_docs)]

pub mod builtin;
pub mod graph;
pub mod reference;
pub mod reference_helper;
pub mod schema_lint;
pub mod syntax;

pub use builtin::{builtin_schemas, ROOT_SCHEMA};
pub use graph::ReferenceGraph;
pub use reference::ReferenceValidator;
pub use reference_helper::{CheckOptions, FoundReferences, ReferenceValidatorHelper};
pub use schema_lint::SchemaLinter;
pub use syntax::SyntaxValidator;
