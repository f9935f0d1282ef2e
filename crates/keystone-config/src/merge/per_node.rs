use tracing::{debug, info};

use crate::names;
use crate::node::ConfigNode;
use crate::role::RoleTag;
use crate::rules::MergeRules;

/// Build the configuration tree for node `node_name`.
///
/// The output has the document root's name and starts as a copy of the
/// children of `Global`. If `node_name` is empty the global tree is returned
/// as-is. Otherwise the output's `Name` attribute is set, and the `Node`
/// section with a matching `Name` (if any) is applied per declared role:
///
/// - an element with no same-named element in the seeded role section is
///   appended;
/// - when the node supplies the reserved runtime element, the seeded element
///   collects one `Override Node="..."` child per node of the document that
///   supplies it, in document order. Nodes that supply it therefore see the
///   same accumulated runtime settings; a node that does not supply it keeps
///   the seeded element unchanged;
/// - any other element fully replaces the first seeded element of that name.
#[must_use]
pub fn generate_per_node_config(
    document: &ConfigNode,
    node_name: &str,
    rules: &MergeRules,
) -> ConfigNode {
    let mut output = ConfigNode::new(document.name());
    if let Some(global) = document.child(names::GLOBAL) {
        output
            .children_mut()
            .extend(global.children().iter().cloned());
    }

    if node_name.is_empty() {
        return output;
    }
    output.set_attribute(names::NAME, node_name);

    let Some(node) = document
        .children_named(names::NODE)
        .find(|n| n.attribute(names::NAME) == Some(node_name))
    else {
        info!(node = node_name, "no Node section for node; using global configuration");
        return output;
    };

    for role in rules.roles() {
        let Some(incoming) = node.child(role.as_str()) else {
            continue;
        };
        if incoming.children().is_empty() {
            continue;
        }
        apply_role_overrides(
            output.child_or_insert(role.as_str()),
            incoming,
            document,
            role,
            rules,
        );
    }

    debug!(node = node_name, "generated per-node configuration");
    output
}

fn apply_role_overrides(
    section: &mut ConfigNode,
    incoming: &ConfigNode,
    document: &ConfigNode,
    role: &RoleTag,
    rules: &MergeRules,
) {
    let seeded = section.children().len();
    let mut runtime_applied = false;

    for element in incoming.children() {
        let existing = section.children()[..seeded]
            .iter()
            .position(|e| e.name() == element.name());

        match existing {
            None => section.push_child(element.clone()),
            Some(index) if element.name() == rules.runtime_element() => {
                if !runtime_applied {
                    let target = &mut section.children_mut()[index];
                    for wrapped in runtime_overrides(document, role, rules) {
                        target.push_child(wrapped);
                    }
                    runtime_applied = true;
                }
            },
            Some(index) => {
                section.children_mut()[index].replace_content_with(element);
            },
        }
    }
}

/// One `Override` per `Node` section supplying the runtime element for `role`.
fn runtime_overrides(document: &ConfigNode, role: &RoleTag, rules: &MergeRules) -> Vec<ConfigNode> {
    document
        .children_named(names::NODE)
        .filter_map(|node| {
            let name = node.attribute(names::NAME)?;
            let runtime = node.child(role.as_str())?.child(rules.runtime_element())?;
            Some(
                ConfigNode::new(names::OVERRIDE)
                    .with_attribute(names::OVERRIDE_NODE, name)
                    .with_children(runtime.children().iter().cloned()),
            )
        })
        .collect()
}
