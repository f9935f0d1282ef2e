use tracing::debug;

use crate::names;
use crate::node::ConfigNode;
use crate::role::RoleTag;
use crate::rules::MergeRules;

/// Append the children of every top-level `Shared` block selecting `role`
/// to the `role` section of `tree`, creating the section if needed.
///
/// `Shared` blocks without a `With` attribute are skipped. Injected children
/// keep document order.
#[must_use]
pub fn merge_role(tree: &ConfigNode, role: &RoleTag, rules: &MergeRules) -> ConfigNode {
    let injected: Vec<ConfigNode> = tree
        .children_named(names::SHARED)
        .filter(|shared| match shared.attribute(names::WITH) {
            Some(with) => rules.selects(with, role),
            None => {
                debug!(role = %role, "skipping Shared block without a With attribute");
                false
            },
        })
        .flat_map(|shared| shared.children().iter().cloned())
        .collect();

    let mut merged = tree.clone();
    let count = injected.len();
    merged
        .child_or_insert(role.as_str())
        .children_mut()
        .extend(injected);
    debug!(role = %role, injected = count, "merged shared blocks into role");
    merged
}

/// [`merge_role`] for every declared role.
#[must_use]
pub fn merge_all_roles(tree: &ConfigNode, rules: &MergeRules) -> ConfigNode {
    rules
        .roles()
        .iter()
        .fold(tree.clone(), |merged, role| merge_role(&merged, role, rules))
}

/// Apply [`merge_all_roles`] to the `Global` section of a document.
///
/// `Shared` blocks live inside `Global`; `Node` sections are left as they
/// are. A document without `Global` is returned unchanged.
#[must_use]
pub fn merge_global_roles(document: &ConfigNode, rules: &MergeRules) -> ConfigNode {
    let mut merged = document.clone();
    match merged.child_mut(names::GLOBAL) {
        Some(global) => {
            *global = merge_all_roles(global, rules);
        },
        None => {
            debug!(root = document.name(), "document has no Global section");
        },
    }
    merged
}
