//! Configuration document loading.
//!
//! Documents are stored as TOML using the serde form of [`ConfigNode`]:
//!
//! ```toml
//! name = "Config"
//!
//! [[children]]
//! name = "Global"
//!
//! [[children.children]]
//! name = "Shared"
//! attributes = { With = "*" }
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::node::ConfigNode;

/// Maximum allowed size of a configuration document (1 MiB).
pub const MAX_DOCUMENT_SIZE: u64 = 1_048_576;

/// A loaded configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    root: ConfigNode,
    source: Option<PathBuf>,
}

impl ConfigDocument {
    /// Wrap an in-memory tree.
    #[must_use]
    pub fn new(root: ConfigNode) -> Self {
        Self { root, source: None }
    }

    /// Load a document from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, exceeds
    /// [`MAX_DOCUMENT_SIZE`], or is not a valid document.
    pub fn load_file(path: &Path) -> ConfigResult<Self> {
        // Check file size before reading to prevent OOM.
        let metadata = std::fs::metadata(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        if metadata.len() > MAX_DOCUMENT_SIZE {
            return Err(ConfigError::ValidationError {
                field: path.display().to_string(),
                message: format!(
                    "config document is {} bytes, exceeding the {} byte limit",
                    metadata.len(),
                    MAX_DOCUMENT_SIZE
                ),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        let root = parse(&content, &path.display().to_string())?;

        info!(path = %path.display(), root = root.name(), "loaded config document");
        Ok(Self {
            root,
            source: Some(path.to_path_buf()),
        })
    }

    /// Parse a document from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the string is not a valid document.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let root = parse(content, "<inline>")?;
        debug!(root = root.name(), "parsed inline config document");
        Ok(Self::new(root))
    }

    /// Render the document as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SerializeError`] if the tree cannot be rendered.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(&self.root).map_err(|source| ConfigError::SerializeError { source })
    }

    /// The root element.
    #[must_use]
    pub fn root(&self) -> &ConfigNode {
        &self.root
    }

    /// Consume the document, returning its root element.
    #[must_use]
    pub fn into_root(self) -> ConfigNode {
        self.root
    }

    /// File the document was loaded from, if any.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

fn parse(content: &str, path: &str) -> ConfigResult<ConfigNode> {
    let root: ConfigNode = toml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: path.to_owned(),
        source: e,
    })?;
    if root.name().trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: format!("{path}: name"),
            message: "root element must have a name".to_owned(),
        });
    }
    Ok(root)
}
