//! Reading [`LogConfig`] from a node's configuration tree.
//!
//! ```text
//! <Logging Level="debug" Format="json" Target="file" Directory="/var/log/keystone"
//!          Prefix="node-1" Rotation="hourly" Directives="keystone_services=trace" />
//! ```
//!
//! Every attribute is optional; absent ones keep their [`LogConfig`] defaults.

use std::path::PathBuf;

use keystone_config::{ConfigNode, names};

use crate::error::{TelemetryError, TelemetryResult};
use crate::logging::{FileRotation, LogConfig, LogFormat, LogTarget};

impl LogConfig {
    /// Build a config from a `Logging` element.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::ConfigError`] if an attribute has an
    /// unknown value, or `Target="file"` is given without `Directory`.
    pub fn from_node(node: &ConfigNode) -> TelemetryResult<Self> {
        let mut config = Self::default();

        if let Some(level) = node.attribute("Level") {
            config.level = level.trim().to_owned();
        }
        if let Some(format) = node.attribute("Format") {
            config.format = parse_format(format)?;
        }
        if let Some(prefix) = node.attribute("Prefix") {
            config.file.prefix = prefix.trim().to_owned();
        }
        if let Some(rotation) = node.attribute("Rotation") {
            config.file.rotation = parse_rotation(rotation)?;
        }
        if let Some(directives) = node.attribute("Directives") {
            config.directives = directives
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_owned)
                .collect();
        }
        if let Some(ansi) = node.attribute("Ansi") {
            config.ansi = parse_bool("Ansi", ansi)?;
        }
        if let Some(timestamps) = node.attribute("Timestamps") {
            config.timestamps = parse_bool("Timestamps", timestamps)?;
        }

        let directory = node.attribute("Directory").map(|d| PathBuf::from(d.trim()));
        match node.attribute("Target").map(|t| t.trim().to_ascii_lowercase()).as_deref() {
            None => {
                if let Some(directory) = directory {
                    config.target = LogTarget::File(directory);
                    config.ansi = false;
                }
            },
            Some("stderr") => config.target = LogTarget::Stderr,
            Some("stdout") => config.target = LogTarget::Stdout,
            Some("file") => {
                let directory = directory.ok_or_else(|| {
                    TelemetryError::ConfigError(
                        "Logging Target=\"file\" requires a Directory attribute".to_owned(),
                    )
                })?;
                config.target = LogTarget::File(directory);
                config.ansi = false;
            },
            Some(other) => {
                return Err(TelemetryError::ConfigError(format!(
                    "unknown Logging Target '{other}'"
                )));
            },
        }

        Ok(config)
    }

    /// Build a config from the first `Logging` element in `tree`, in document
    /// order.
    ///
    /// `Shared` blocks are not searched; their contents only take effect once
    /// merged into a role section. Returns `None` if no other `Logging`
    /// element exists.
    ///
    /// # Errors
    ///
    /// See [`LogConfig::from_node`].
    pub fn from_config_tree(tree: &ConfigNode) -> TelemetryResult<Option<Self>> {
        if tree.name() == names::LOGGING {
            return Self::from_node(tree).map(Some);
        }
        find_logging(tree).map(Self::from_node).transpose()
    }
}

fn find_logging(tree: &ConfigNode) -> Option<&ConfigNode> {
    tree.children()
        .iter()
        .filter(|child| child.name() != names::SHARED)
        .find_map(|child| {
            if child.name() == names::LOGGING {
                Some(child)
            } else {
                find_logging(child)
            }
        })
}

fn parse_format(value: &str) -> TelemetryResult<LogFormat> {
    match value.trim().to_ascii_lowercase().as_str() {
        "pretty" => Ok(LogFormat::Pretty),
        "compact" => Ok(LogFormat::Compact),
        "json" => Ok(LogFormat::Json),
        "full" => Ok(LogFormat::Full),
        other => Err(TelemetryError::ConfigError(format!(
            "unknown Logging Format '{other}'"
        ))),
    }
}

fn parse_rotation(value: &str) -> TelemetryResult<FileRotation> {
    match value.trim().to_ascii_lowercase().as_str() {
        "daily" => Ok(FileRotation::Daily),
        "hourly" => Ok(FileRotation::Hourly),
        "minutely" => Ok(FileRotation::Minutely),
        "never" => Ok(FileRotation::Never),
        other => Err(TelemetryError::ConfigError(format!(
            "unknown Logging Rotation '{other}'"
        ))),
    }
}

fn parse_bool(attribute: &str, value: &str) -> TelemetryResult<bool> {
    value.trim().parse().map_err(|_| {
        TelemetryError::ConfigError(format!(
            "Logging {attribute} must be true or false, got '{value}'"
        ))
    })
}
