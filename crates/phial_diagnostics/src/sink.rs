//! Thread-safe error accumulator backing the compiler's error log.

use crate::error::ValidationError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A thread-safe accumulator for [`ValidationError`]s.
///
/// The non-warning count is tracked atomically so `has_errors` never locks
/// the error vector.
pub struct ErrorSink {
    errors: Mutex<Vec<ValidationError>>,
    error_count: AtomicUsize,
}

impl ErrorSink {
    /// Creates a new empty sink.
    pub fn new() -> Self {
        Self {
            errors: Mutex::new(Vec::new()),
            error_count: AtomicUsize::new(0),
        }
    }

    /// Records an error. Warnings do not count towards `has_errors`.
    pub fn emit(&self, error: ValidationError) {
        if !error.is_warning() {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        let mut errors = self.errors.lock().unwrap();
        errors.push(error);
    }

    /// Records a batch of errors.
    pub fn emit_all(&self, batch: impl IntoIterator<Item = ValidationError>) {
        for error in batch {
            self.emit(error);
        }
    }

    /// Returns `true` if any non-warning error has been recorded.
    pub fn has_errors(&self) -> bool {
        self.error_count.load(Ordering::Relaxed) > 0
    }

    /// The number of non-warning errors recorded so far.
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Takes all accumulated errors, leaving the sink empty.
    pub fn take_all(&self) -> Vec<ValidationError> {
        let mut errors = self.errors.lock().unwrap();
        std::mem::take(&mut *errors)
    }

    /// Returns a snapshot of all accumulated errors without draining.
    pub fn errors(&self) -> Vec<ValidationError> {
        let errors = self.errors.lock().unwrap();
        errors.clone()
    }
}

impl Default for ErrorSink {
    fn default() -> Self {
        Self::new()
    }
}
