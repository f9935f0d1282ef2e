//! Turning a cluster document into a running node's container.

use std::sync::Arc;

use keystone_config::{
    AddressResolver, ConfigDocument, ConfigNode, MergeRules, RoleTag, SystemAddressResolver,
    autofill_endpoints, merge,
};
use keystone_services::{Clock, ServiceContainer, ServiceModule, ServiceResult};
use keystone_telemetry::setup_logging;
use tracing::{info, info_span};

use crate::error::{BootstrapError, BootstrapResult};
use crate::node_config::NodeConfig;

/// A bootstrapped node: its sealed service container and its configuration.
pub struct NodeBootstrap {
    container: Arc<ServiceContainer>,
    config: Arc<NodeConfig>,
}

impl NodeBootstrap {
    /// Start building a node.
    #[must_use]
    pub fn builder() -> NodeBootstrapBuilder {
        NodeBootstrapBuilder::default()
    }

    /// The node's service container.
    #[must_use]
    pub fn container(&self) -> &Arc<ServiceContainer> {
        &self.container
    }

    /// The node's configuration.
    #[must_use]
    pub fn config(&self) -> &Arc<NodeConfig> {
        &self.config
    }

    /// Resolve capability `C` from the node's container.
    ///
    /// # Errors
    ///
    /// See [`ServiceContainer::get`].
    pub fn get<C: ?Sized + Send + Sync + 'static>(&self) -> ServiceResult<Arc<C>> {
        self.container.get::<C>()
    }

    /// Install the global logger from the `Logging` element of `role`.
    ///
    /// Returns `false` without touching logging if the role has no
    /// `Logging` element.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is invalid or a logger is already
    /// installed.
    pub fn init_logging(&self, role: &RoleTag) -> BootstrapResult<bool> {
        match self.config.logging(role)? {
            Some(log_config) => {
                setup_logging(&log_config)?;
                Ok(true)
            },
            None => Ok(false),
        }
    }

    /// Split into container and configuration.
    #[must_use]
    pub fn into_parts(self) -> (Arc<ServiceContainer>, Arc<NodeConfig>) {
        (self.container, self.config)
    }
}

/// Builder for [`NodeBootstrap`].
pub struct NodeBootstrapBuilder {
    document: Option<ConfigNode>,
    node_name: String,
    rules: MergeRules,
    resolver: Arc<dyn AddressResolver>,
    clock: Option<Arc<dyn Clock>>,
    modules: Vec<Arc<dyn ServiceModule>>,
}

impl Default for NodeBootstrapBuilder {
    fn default() -> Self {
        Self {
            document: None,
            node_name: String::new(),
            rules: MergeRules::default(),
            resolver: Arc::new(SystemAddressResolver),
            clock: None,
            modules: Vec::new(),
        }
    }
}

impl NodeBootstrapBuilder {
    /// The cluster document.
    #[must_use]
    pub fn document(mut self, document: ConfigNode) -> Self {
        self.document = Some(document);
        self
    }

    /// The cluster document, as loaded by [`ConfigDocument`].
    #[must_use]
    pub fn config_document(self, document: ConfigDocument) -> Self {
        self.document(document.into_root())
    }

    /// Name of the node being bootstrapped. Empty means global-only.
    #[must_use]
    pub fn node(mut self, name: impl Into<String>) -> Self {
        self.node_name = name.into();
        self
    }

    /// Merge rules; these declare the roles.
    #[must_use]
    pub fn rules(mut self, rules: MergeRules) -> Self {
        self.rules = rules;
        self
    }

    /// Address source for endpoint autofill. Defaults to the host's interfaces.
    #[must_use]
    pub fn address_resolver(mut self, resolver: Arc<dyn AddressResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Clock the container hands out. Defaults to the system clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Add a service module.
    #[must_use]
    pub fn module(mut self, module: impl ServiceModule + 'static) -> Self {
        self.modules.push(Arc::new(module));
        self
    }

    /// Merge the configuration, create the container, register the modules
    /// and seal it.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::MissingDocument`] if no document was given,
    /// or [`BootstrapError::Services`] if the configuration cannot be pinned.
    pub fn build(self) -> BootstrapResult<NodeBootstrap> {
        let document = self.document.ok_or(BootstrapError::MissingDocument)?;
        let span = info_span!("bootstrap", node = %self.node_name);
        let _guard = span.enter();

        // 1. Inject Shared blocks into every role of Global
        let merged = merge::merge_global_roles(&document, &self.rules);

        // 2. Apply this node's overrides
        let tree = merge::generate_per_node_config(&merged, &self.node_name, &self.rules);

        // 3. Fill in endpoint addresses left to the host
        let tree = autofill_endpoints(&tree, self.resolver.as_ref());
        let config = Arc::new(NodeConfig::new(tree));

        // 4. Create the container and pin the configuration
        let container = Arc::new(match self.clock {
            Some(clock) => ServiceContainer::with_clock(clock),
            None => ServiceContainer::new(),
        });
        container.set_capability(Arc::clone(&config))?;

        // 5. Register service modules
        let modules: Vec<&dyn ServiceModule> = self.modules.iter().map(AsRef::as_ref).collect();
        let registered = container.rescan(&modules);

        // 6. Close the bootstrap window
        container.seal();

        info!(
            roles = self.rules.roles().len(),
            modules = modules.len(),
            registered,
            "node bootstrapped"
        );
        Ok(NodeBootstrap { container, config })
    }
}

#[cfg(test)]
mod tests {
    use keystone_config::names;
    use keystone_services::{Param, Registration, ServiceError, ServiceTable};
    use keystone_test::{FixedAddressResolver, ManualClock, sample_document, sample_rules};

    use super::*;

    fn server() -> RoleTag {
        RoleTag::new("Cluster.Server")
    }

    fn builder(node: &str) -> NodeBootstrapBuilder {
        NodeBootstrap::builder()
            .document(sample_document())
            .rules(sample_rules())
            .node(node)
            .address_resolver(Arc::new(FixedAddressResolver::single([10, 0, 0, 2])))
    }

    #[test]
    fn test_missing_document() {
        let err = NodeBootstrap::builder().build().err().unwrap();
        assert!(matches!(err, BootstrapError::MissingDocument));
    }

    #[test]
    fn test_config_is_pinned_and_container_sealed() {
        let node = builder("node-1").build().unwrap();

        let pinned = node.get::<NodeConfig>().unwrap();
        assert!(Arc::ptr_eq(&pinned, node.config()));
        assert!(node.container().is_sealed());

        let err = node
            .container()
            .set_capability(Arc::new(NodeConfig::new(ConfigNode::new("Other"))))
            .unwrap_err();
        assert!(matches!(err, ServiceError::BootstrapClosed { .. }));
    }

    #[test]
    fn test_node_overrides_applied() {
        let node = builder("node-1").build().unwrap();
        let config = node.config();

        assert_eq!(config.node_name(), Some("node-1"));
        assert_eq!(
            config.endpoint(&server()).unwrap(),
            "10.0.0.1:11111".parse().unwrap()
        );
        assert_eq!(
            config.access_address(&server()).unwrap().as_deref(),
            Some("node-1.example.net:11111")
        );

        let section = config.role(&server()).unwrap();
        assert!(section.child("Storage").is_some());
        assert_eq!(
            section
                .child("ActorRuntime")
                .unwrap()
                .children_named(names::OVERRIDE)
                .count(),
            2
        );
    }

    #[test]
    fn test_endpoint_address_autofilled() {
        let node = builder("node-2").build().unwrap();
        assert_eq!(
            node.config().endpoint(&server()).unwrap(),
            "10.0.0.2:11111".parse().unwrap()
        );
    }

    #[test]
    fn test_client_role_has_no_endpoint() {
        let node = builder("node-1").build().unwrap();
        let err = node
            .config()
            .endpoint(&RoleTag::new("Cluster.Client"))
            .unwrap_err();
        assert!(matches!(err, keystone_config::ConfigError::MissingElement { .. }));
    }

    #[test]
    fn test_logging_read_from_shared_block() {
        let node = builder("node-1").build().unwrap();
        let log_config = node.config().logging(&server()).unwrap().unwrap();
        assert_eq!(log_config.level, "info");
        assert_eq!(log_config.format, keystone_telemetry::LogFormat::Compact);
    }

    fn logging(level: &str) -> ConfigNode {
        ConfigNode::new(names::LOGGING).with_attribute("Level", level)
    }

    #[test]
    fn test_node_logging_override_wins_over_shared_block() {
        let document = ConfigNode::new("Cluster")
            .with_child(
                ConfigNode::new(names::GLOBAL)
                    .with_child(
                        ConfigNode::new(names::SHARED)
                            .with_attribute(names::WITH, "*")
                            .with_child(logging("info")),
                    )
                    .with_child(ConfigNode::new("Cluster.Server")),
            )
            .with_child(
                ConfigNode::new(names::NODE)
                    .with_attribute(names::NAME, "node-1")
                    .with_child(ConfigNode::new("Cluster.Server").with_child(logging("trace"))),
            );

        let node = NodeBootstrap::builder()
            .document(document)
            .rules(sample_rules())
            .node("node-1")
            .address_resolver(Arc::new(FixedAddressResolver::none()))
            .build()
            .unwrap();

        let config = node.config();
        assert_eq!(config.logging(&server()).unwrap().unwrap().level, "trace");
        assert_eq!(
            config
                .logging(&RoleTag::new("Cluster.Client"))
                .unwrap()
                .unwrap()
                .level,
            "info"
        );
    }

    #[test]
    fn test_shared_logging_for_other_role_not_applied() {
        let document = ConfigNode::new("Cluster").with_child(
            ConfigNode::new(names::GLOBAL)
                .with_child(
                    ConfigNode::new(names::SHARED)
                        .with_attribute(names::WITH, "Cluster.Client")
                        .with_child(logging("debug")),
                )
                .with_child(ConfigNode::new("Cluster.Server")),
        );

        let node = NodeBootstrap::builder()
            .document(document)
            .rules(sample_rules())
            .node("node-1")
            .address_resolver(Arc::new(FixedAddressResolver::none()))
            .build()
            .unwrap();

        assert!(node.config().logging(&server()).unwrap().is_none());
        assert!(!node.init_logging(&server()).unwrap());
    }

    #[test]
    fn test_modules_registered_with_config_dependency() {
        trait Listener: Send + Sync {
            fn port(&self) -> u16;
        }
        struct ServerListener(u16);
        impl Listener for ServerListener {
            fn port(&self) -> u16 {
                self.0
            }
        }

        let module = ServiceTable::new("listener").with(
            Registration::<dyn Listener>::implemented_by::<ServerListener>()
                .constructor([Param::capability::<NodeConfig>()], |deps| {
                    let config = deps.get::<NodeConfig>()?;
                    let endpoint = config.endpoint(&RoleTag::new("Cluster.Server"))?;
                    Ok(Arc::new(ServerListener(endpoint.port())) as Arc<dyn Listener>)
                })
                .build(),
        );

        let node = builder("node-1")
            .clock(Arc::new(ManualClock::epoch()))
            .module(module)
            .build()
            .unwrap();

        assert!(node.container().is_registered::<dyn Listener>());
        assert_eq!(node.get::<dyn Listener>().unwrap().port(), 11111);
        assert_eq!(
            node.get::<dyn Clock>().unwrap().now(),
            ManualClock::epoch().now()
        );
    }
}
