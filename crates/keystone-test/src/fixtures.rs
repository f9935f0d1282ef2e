//! Sample configuration documents.
//!
//! The sample describes a two-role cluster (`Cluster.Server`,
//! `Cluster.Client`) with two server nodes:
//!
//! - `node-1` pins its endpoint address and adds runtime settings.
//! - `node-2` leaves its endpoint address to autofill, raises the message
//!   timeout and adds its own runtime settings.

use keystone_config::{ConfigNode, MergeRules, RoleTag};

/// [`sample_document`] in its TOML encoding.
pub const SAMPLE_DOCUMENT_TOML: &str = r#"
name = "Cluster"

[[children]]
name = "Global"

[[children.children]]
name = "Shared"
attributes = { With = "*" }

[[children.children.children]]
name = "Logging"
attributes = { Level = "info", Format = "compact" }

[[children.children]]
name = "Shared"
attributes = { With = "Cluster.Server" }

[[children.children.children]]
name = "Storage"
attributes = { Provider = "memory" }

[[children.children]]
name = "Cluster.Server"

[[children.children.children]]
name = "Endpoint"
attributes = { Port = "11111" }

[[children.children.children]]
name = "Messaging"
attributes = { ResponseTimeout = "30s" }

[[children.children.children]]
name = "ActorRuntime"
attributes = { CollectionAge = "2h" }

[[children.children]]
name = "Cluster.Client"

[[children.children.children]]
name = "Messaging"
attributes = { ResponseTimeout = "10s" }

[[children]]
name = "Node"
attributes = { Name = "node-1" }

[[children.children]]
name = "Cluster.Server"

[[children.children.children]]
name = "Endpoint"
attributes = { Address = "10.0.0.1", Port = "11111", AccessAddr = "node-1.example.net:11111" }

[[children.children.children]]
name = "ActorRuntime"

[[children.children.children.children]]
name = "Deactivation"
attributes = { Age = "1h" }

[[children]]
name = "Node"
attributes = { Name = "node-2" }

[[children.children]]
name = "Cluster.Server"

[[children.children.children]]
name = "Messaging"
attributes = { ResponseTimeout = "60s" }

[[children.children.children]]
name = "ActorRuntime"

[[children.children.children.children]]
name = "Deactivation"
attributes = { Age = "3h" }
"#;

fn element(name: &str, attributes: &[(&str, &str)]) -> ConfigNode {
    attributes
        .iter()
        .fold(ConfigNode::new(name), |node, (key, value)| node.with_attribute(*key, *value))
}

fn runtime(age: &str) -> ConfigNode {
    ConfigNode::new("ActorRuntime").with_child(element("Deactivation", &[("Age", age)]))
}

/// The sample cluster document.
#[must_use]
pub fn sample_document() -> ConfigNode {
    let global = ConfigNode::new("Global")
        .with_child(
            element("Shared", &[("With", "*")])
                .with_child(element("Logging", &[("Level", "info"), ("Format", "compact")])),
        )
        .with_child(
            element("Shared", &[("With", "Cluster.Server")])
                .with_child(element("Storage", &[("Provider", "memory")])),
        )
        .with_child(
            ConfigNode::new("Cluster.Server")
                .with_child(element("Endpoint", &[("Port", "11111")]))
                .with_child(element("Messaging", &[("ResponseTimeout", "30s")]))
                .with_child(element("ActorRuntime", &[("CollectionAge", "2h")])),
        )
        .with_child(
            ConfigNode::new("Cluster.Client")
                .with_child(element("Messaging", &[("ResponseTimeout", "10s")])),
        );

    let node_1 = element("Node", &[("Name", "node-1")]).with_child(
        ConfigNode::new("Cluster.Server")
            .with_child(element(
                "Endpoint",
                &[
                    ("Address", "10.0.0.1"),
                    ("Port", "11111"),
                    ("AccessAddr", "node-1.example.net:11111"),
                ],
            ))
            .with_child(runtime("1h")),
    );

    let node_2 = element("Node", &[("Name", "node-2")]).with_child(
        ConfigNode::new("Cluster.Server")
            .with_child(element("Messaging", &[("ResponseTimeout", "60s")]))
            .with_child(runtime("3h")),
    );

    ConfigNode::new("Cluster")
        .with_child(global)
        .with_child(node_1)
        .with_child(node_2)
}

/// Merge rules declaring the sample's two roles.
#[must_use]
pub fn sample_rules() -> MergeRules {
    MergeRules::new([
        RoleTag::from_identifier("Cluster_Server"),
        RoleTag::from_identifier("Cluster_Client"),
    ])
}
