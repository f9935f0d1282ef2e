//! Role-based merging of configuration trees.
//!
//! Two transforms turn a shared multi-role document into the tree a single
//! node runs with:
//!
//! 1. [`merge_all_roles`] injects the children of every `Shared` block into
//!    the role sections its `With` attribute selects.
//! 2. [`generate_per_node_config`] seeds a tree from `Global` and applies one
//!    node's per-role overrides on top.
//!
//! Both take the input by reference and return a new tree.

mod per_node;
mod shared;

pub use per_node::generate_per_node_config;
pub use shared::{merge_all_roles, merge_global_roles, merge_role};
