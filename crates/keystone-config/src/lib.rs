#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Configuration trees for Keystone nodes.
//!
//! A cluster is described by one document shared by every node. The
//! document has a `Global` section holding one sub-section per deployment
//! role, `Shared` blocks that inject settings into several roles at once,
//! and `Node` sections with per-node overrides. This crate turns that
//! document into the tree a single node runs with.
//!
//! # Usage
//!
//! ```rust
//! use keystone_config::{ConfigDocument, MergeRules, RoleTag, merge};
//!
//! let document = ConfigDocument::from_toml_str(r#"
//!     name = "Config"
//!
//!     [[children]]
//!     name = "Global"
//!
//!     [[children.children]]
//!     name = "Shared"
//!     attributes = { With = "*" }
//!
//!     [[children.children.children]]
//!     name = "Tracing"
//!     attributes = { Level = "info" }
//!
//!     [[children]]
//!     name = "Node"
//!     attributes = { Name = "node-1" }
//! "#)?;
//!
//! let rules = MergeRules::new([RoleTag::from_identifier("Cluster_Server")]);
//! let merged = merge::merge_global_roles(document.root(), &rules);
//! let config = merge::generate_per_node_config(&merged, "node-1", &rules);
//!
//! assert_eq!(config.attribute("Name"), Some("node-1"));
//! assert!(config.child("Cluster.Server").unwrap().child("Tracing").is_some());
//! # Ok::<(), keystone_config::ConfigError>(())
//! ```
//!
//! # Design
//!
//! Trees are values. Every transform borrows its input and returns a new
//! tree, so a document can be merged for many nodes without interference.
//! The markup format a deployment uses is its own business; this crate
//! only ships a TOML encoding of the same tree.

/// Endpoint autofill and parsing.
pub mod endpoint;
/// Configuration error types.
pub mod error;
/// Document loading.
pub mod loader;
/// Role and per-node merging.
pub mod merge;
pub mod names;
/// The configuration tree.
pub mod node;
/// Deployment roles.
pub mod role;
/// Merge parameters.
pub mod rules;

pub mod prelude;

pub use endpoint::{
    AddressResolver, SystemAddressResolver, autofill_endpoints, read_access_address,
    read_endpoint, set_address_if_not_exist,
};
pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigDocument, MAX_DOCUMENT_SIZE};
pub use node::ConfigNode;
pub use role::RoleTag;
pub use rules::MergeRules;
