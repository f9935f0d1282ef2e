//! Prelude module - commonly used types for convenient import.
//!
//! Use `use keystone_config::prelude::*;` to import all essential types.

pub use crate::{ConfigDocument, ConfigError, ConfigNode, ConfigResult, MergeRules, RoleTag};

pub use crate::{AddressResolver, SystemAddressResolver};

pub use crate::merge::{generate_per_node_config, merge_all_roles, merge_global_roles};
