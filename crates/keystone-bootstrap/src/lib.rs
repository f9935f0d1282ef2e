#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(clippy::module_name_repetitions)]

//! Keystone Bootstrap - from cluster document to running node.
//!
//! [`NodeBootstrap::builder`] takes the shared cluster document, the node's
//! name, the merge rules and the node's service modules, and produces:
//!
//! - a [`NodeConfig`] holding the node's merged configuration tree
//! - a sealed [`ServiceContainer`](keystone_services::ServiceContainer) with
//!   the `NodeConfig` pinned as a capability and every module registered
//!
//! ```rust
//! use std::sync::Arc;
//! use keystone_bootstrap::{NodeBootstrap, NodeConfig};
//! use keystone_config::{ConfigDocument, MergeRules, RoleTag};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let document = ConfigDocument::from_toml_str(r#"
//!     name = "Cluster"
//!
//!     [[children]]
//!     name = "Global"
//!
//!     [[children.children]]
//!     name = "Cluster.Server"
//!
//!     [[children.children.children]]
//!     name = "Endpoint"
//!     attributes = { Address = "10.0.0.1", Port = "11111" }
//! "#)?;
//!
//! let node = NodeBootstrap::builder()
//!     .config_document(document)
//!     .rules(MergeRules::new([RoleTag::new("Cluster.Server")]))
//!     .node("node-1")
//!     .build()?;
//!
//! let config = node.get::<NodeConfig>()?;
//! assert_eq!(config.endpoint(&RoleTag::new("Cluster.Server"))?.port(), 11111);
//! # Ok(())
//! # }
//! ```

mod bootstrap;
mod error;
mod node_config;

pub mod prelude;

pub use bootstrap::{NodeBootstrap, NodeBootstrapBuilder};
pub use error::{BootstrapError, BootstrapResult};
pub use node_config::NodeConfig;
