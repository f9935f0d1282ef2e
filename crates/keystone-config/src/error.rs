use std::io;
use thiserror::Error;

/// Configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration document.
    #[error("Failed to read config document at {path}: {source}")]
    ReadError {
        /// Path to the document that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to parse a TOML configuration document.
    #[error("Failed to parse config document at {path}: {source}")]
    ParseError {
        /// Path to the document that failed to parse, or `<inline>`.
        path: String,
        /// Underlying TOML parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Failed to render a configuration tree as TOML.
    #[error("Failed to serialize config tree: {source}")]
    SerializeError {
        /// Underlying TOML serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// A required child element is absent.
    #[error("Element '{parent}' has no '{element}' child")]
    MissingElement {
        /// Name of the missing element.
        element: String,
        /// Name of the element that should contain it.
        parent: String,
    },

    /// A required attribute is absent.
    #[error("Element '{element}' is missing required attribute '{attribute}'")]
    MissingAttribute {
        /// Name of the missing attribute.
        attribute: String,
        /// Name of the element that should carry it.
        element: String,
    },

    /// An attribute value could not be parsed.
    #[error("Attribute '{attribute}' of element '{element}' has invalid value '{value}': {message}")]
    InvalidAttribute {
        /// Name of the attribute.
        attribute: String,
        /// Name of the element carrying it.
        element: String,
        /// The offending value.
        value: String,
        /// Parse failure description.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// Field that failed validation.
        field: String,
        /// Validation failure description.
        message: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
