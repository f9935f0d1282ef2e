//! Bootstrap error types.

use keystone_config::ConfigError;
use keystone_services::ServiceError;
use keystone_telemetry::TelemetryError;
use thiserror::Error;

/// Errors that can occur while bootstrapping a node.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// No configuration document was supplied to the builder.
    #[error("no configuration document was supplied")]
    MissingDocument,

    /// The configuration document could not be loaded or read.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The service container rejected an operation.
    #[error("service error: {0}")]
    Services(#[from] ServiceError),

    /// Logging could not be configured.
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
}

/// Result type for bootstrap operations.
pub type BootstrapResult<T> = Result<T, BootstrapError>;
