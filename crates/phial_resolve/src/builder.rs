//! The object-builder interface.
//!
//! Instantiation itself is the host's business: phial hands a builder the
//! fully resolved constructor arguments and call list and receives a live
//! instance back. The builder performs no graph-shaped reasoning.

use crate::registry::Resolved;
use phial_definitions::ServiceDef;

/// A method call with its arguments fully resolved.
#[derive(Clone, Debug)]
pub struct ResolvedCall<I> {
    /// The method to invoke on the constructed instance.
    pub method: String,
    /// The resolved call arguments, in order.
    pub arguments: Vec<Resolved<I>>,
}

/// Errors a builder can raise.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The definition is a stub and must never be constructed.
    #[error("Service '{0}' is a stub service and cannot be accessed or injected")]
    Stub(String),

    /// Construction failed in the host environment.
    #[error("could not construct service '{key}': {message}")]
    Construction {
        /// The service being constructed.
        key: String,
        /// The host's failure description.
        message: String,
    },
}

/// Constructs service instances from resolved definition data.
///
/// Implementations must refuse definitions with `stub` set by returning
/// [`BuildError::Stub`] rather than attempting construction.
pub trait ObjectBuilder {
    /// The host's representation of a constructed service.
    type Instance;

    /// Constructs the service, applying setter-injection calls afterwards.
    fn create_service(
        &self,
        key: &str,
        definition: &ServiceDef,
        arguments: Vec<Resolved<Self::Instance>>,
        calls: Vec<ResolvedCall<Self::Instance>>,
    ) -> Result<Self::Instance, BuildError>;
}
