//! Service resolution error types.

use std::sync::Arc;

use thiserror::Error;

/// Boxed error returned by service factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while registering or resolving services.
///
/// Construction outcomes are cached per capability, so this type is `Clone`:
/// every caller of a failed capability receives the same error.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// No implementation is registered for the requested capability.
    #[error(
        "no implementation registered for capability '{capability}'; \
         add a descriptor for it to a service module or pin an instance with set_capability"
    )]
    UnregisteredCapability {
        /// Name of the requested capability.
        capability: &'static str,
    },

    /// None of the implementation's constructors can be satisfied with capabilities.
    #[error("implementation '{implementation}' has no constructor whose parameters are all capabilities")]
    NoEligibleConstructor {
        /// Name of the implementation type.
        implementation: &'static str,
    },

    /// The implementation's factory returned an error.
    #[error("constructing '{implementation}' for capability '{capability}' failed: {source}")]
    ConstructionFailed {
        /// Name of the capability being constructed.
        capability: &'static str,
        /// Name of the implementation type.
        implementation: &'static str,
        /// Error returned by the factory.
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// The implementation's factory panicked.
    #[error("constructing '{implementation}' for capability '{capability}' panicked")]
    ConstructionPanicked {
        /// Name of the capability being constructed.
        capability: &'static str,
        /// Name of the implementation type.
        implementation: &'static str,
    },

    /// The selected constructors form a dependency cycle.
    #[error("cyclic dependency: {}", .path.join(" -> "))]
    CyclicDependency {
        /// Capabilities along the cycle, starting and ending with the same one.
        path: Vec<&'static str>,
    },

    /// A factory asked for a dependency its constructor did not declare.
    #[error("capability '{capability}' was not declared as a constructor parameter")]
    MissingDependency {
        /// Name of the requested dependency.
        capability: &'static str,
    },

    /// The cached instance is not of the requested type.
    #[error("instance cached for capability '{capability}' has an unexpected type")]
    TypeMismatch {
        /// Name of the requested capability.
        capability: &'static str,
    },

    /// `set_capability` was called after the container was sealed.
    #[error("bootstrap window is closed; capability '{capability}' can no longer be overridden")]
    BootstrapClosed {
        /// Name of the capability that was being overridden.
        capability: &'static str,
    },

    /// The capability is provided by the container itself and cannot be overridden.
    #[error("capability '{capability}' is reserved by the container")]
    ReservedCapability {
        /// Name of the reserved capability.
        capability: &'static str,
    },
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
