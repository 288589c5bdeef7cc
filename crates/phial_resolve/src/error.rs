//! Runtime resolution errors.

/// Errors raised while resolving references at construction time.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A service token named a key with no registered instance.
    #[error("Tried to inject the service '{0}', but it doesn't exist")]
    MissingService(String),

    /// A parameter token named a key with no registered parameter.
    #[error("Tried to inject the parameter '{0}' in an argument list, but it doesn't exist")]
    MissingParameter(String),

    /// A parameter was substituted twice within one value: a circular
    /// reference.
    #[error("Circular reference found for the key '{0}'")]
    CircularReference(String),

    /// The bounded substitution loop ran out of iterations; the safety net
    /// for cycles that escape static detection.
    #[error("Could not resolve parameter '{0}'. The maximum iteration limit was exceeded")]
    IterationLimitExceeded(String),

    /// A container-valued parameter was embedded inside a longer string.
    #[error("The parameter '{0}' does not have a scalar value and cannot be embedded in a string")]
    NonScalarSubstitution(String),

    /// A constant token named a class the host does not know.
    #[error("Referenced class '{0}' doesn't exist")]
    MissingClass(String),

    /// A constant token named a constant the host does not define.
    #[error("Referenced constant '{0}' doesn't exist")]
    MissingConstant(String),
}
