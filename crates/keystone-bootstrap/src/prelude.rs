//! Prelude module - commonly used types for convenient import.
//!
//! Use `use keystone_bootstrap::prelude::*;` to import all essential types.

pub use crate::{BootstrapError, BootstrapResult, NodeBootstrap, NodeBootstrapBuilder, NodeConfig};
