//! Validation error data, accumulation, and rendering.
//!
//! Compilation problems are plain data: [`ValidationError`]s are collected
//! into `Vec`s by each pass (nothing is thrown per error) until a phase
//! boundary decides whether to abort. The thread-safe [`ErrorSink`] backs
//! the compiler's optional error log, and [`TerminalRenderer`] formats
//! errors for human output.

#![warn(missing_docs)]

pub mod error;
pub mod lint_error;
pub mod renderer;
pub mod sink;

pub use error::{add_context_to_all, ErrorKind, ValidationError};
pub use lint_error::SchemaLintError;
pub use renderer::TerminalRenderer;
pub use sink::ErrorSink;
