//! The per-node configuration handed to services.

use std::net::SocketAddr;

use keystone_config::{
    ConfigError, ConfigNode, ConfigResult, RoleTag, names, read_access_address, read_endpoint,
};
use keystone_telemetry::{LogConfig, TelemetryResult};

/// A node's merged configuration tree.
///
/// Pinned in the service container by [`NodeBootstrap`](crate::NodeBootstrap),
/// so services can take it as a constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    tree: ConfigNode,
}

impl NodeConfig {
    /// Wrap a per-node tree.
    #[must_use]
    pub fn new(tree: ConfigNode) -> Self {
        Self { tree }
    }

    /// The node name, if the tree was generated for a named node.
    #[must_use]
    pub fn node_name(&self) -> Option<&str> {
        self.tree.attribute(names::NAME)
    }

    /// The whole tree.
    #[must_use]
    pub fn tree(&self) -> &ConfigNode {
        &self.tree
    }

    /// The section for `role`.
    #[must_use]
    pub fn role(&self, role: &RoleTag) -> Option<&ConfigNode> {
        self.tree.child(role.as_str())
    }

    /// Socket address of `role`'s endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingElement`] if the tree has no section for
    /// `role`, or any error of [`read_endpoint`].
    pub fn endpoint(&self, role: &RoleTag) -> ConfigResult<SocketAddr> {
        read_endpoint(self.section(role)?)
    }

    /// Externally reachable address of `role`'s endpoint, if declared.
    ///
    /// # Errors
    ///
    /// Same as [`endpoint`](Self::endpoint).
    pub fn access_address(&self, role: &RoleTag) -> ConfigResult<Option<String>> {
        read_access_address(self.section(role)?)
    }

    /// Logging settings from the `Logging` element of `role`'s section.
    ///
    /// The section already carries `Shared` injections and this node's
    /// overrides. Returns `None` if the role has no section or no `Logging`.
    ///
    /// # Errors
    ///
    /// Returns an error if the element has invalid values.
    pub fn logging(&self, role: &RoleTag) -> TelemetryResult<Option<LogConfig>> {
        self.role(role)
            .and_then(|section| section.child(names::LOGGING))
            .map(LogConfig::from_node)
            .transpose()
    }

    fn section(&self, role: &RoleTag) -> ConfigResult<&ConfigNode> {
        self.role(role).ok_or_else(|| ConfigError::MissingElement {
            element: role.to_string(),
            parent: self.tree.qualified_name(),
        })
    }
}
