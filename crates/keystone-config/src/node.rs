//! The configuration tree.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One element of a configuration document.
///
/// A node has a (optionally namespaced) name, ordered string attributes and
/// an ordered list of children. Sibling names may repeat and child order is
/// significant: merges append in document order and look up the first match.
///
/// Nodes are plain values. The merge functions take a tree by reference and
/// return a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigNode {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    attributes: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<ConfigNode>,
}

impl ConfigNode {
    /// Create an element with no attributes or children.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the element's namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Add or overwrite an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Append a child.
    #[must_use]
    pub fn with_child(mut self, child: ConfigNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children in order.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = ConfigNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Local name of the element.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace of the element, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// `namespace:name`, or just the name.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}:{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Value of attribute `key`.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// All attributes, in document order.
    #[must_use]
    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    /// Set attribute `key`, keeping its position if it already exists.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Remove attribute `key`, preserving the order of the rest.
    pub fn remove_attribute(&mut self, key: &str) -> Option<String> {
        self.attributes.shift_remove(key)
    }

    /// Children, in document order.
    #[must_use]
    pub fn children(&self) -> &[ConfigNode] {
        &self.children
    }

    /// Mutable access to the children.
    pub fn children_mut(&mut self) -> &mut Vec<ConfigNode> {
        &mut self.children
    }

    /// First child named `name`.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&ConfigNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// First child named `name`, mutably.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut ConfigNode> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Every child named `name`, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ConfigNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First child named `name`, appending an empty one if there is none.
    pub fn child_or_insert(&mut self, name: &str) -> &mut ConfigNode {
        let index = match self.children.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.children.push(ConfigNode::new(name));
                self.children.len().saturating_sub(1)
            },
        };
        &mut self.children[index]
    }

    /// Append a child.
    pub fn push_child(&mut self, child: ConfigNode) {
        self.children.push(child);
    }

    /// Replace this element's attributes and children with `other`'s.
    ///
    /// The element keeps its own name and namespace.
    pub fn replace_content_with(&mut self, other: &ConfigNode) {
        self.attributes.clone_from(&other.attributes);
        self.children.clone_from(&other.children);
    }

    /// Apply `f` to this element and every descendant, parents first.
    pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut ConfigNode)) {
        f(self);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }

    /// Every descendant (excluding `self`) named `name`, depth-first.
    #[must_use]
    pub fn descendants_named(&self, name: &str) -> Vec<&ConfigNode> {
        let mut found = Vec::new();
        self.collect_named(name, &mut found);
        found
    }

    fn collect_named<'a>(&'a self, name: &str, found: &mut Vec<&'a ConfigNode>) {
        for child in &self.children {
            if child.name == name {
                found.push(child);
            }
            child.collect_named(name, found);
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        write!(f, "{indent}<{}", self.qualified_name())?;
        for (key, value) in &self.attributes {
            write!(f, " {key}=\"{value}\"")?;
        }
        if self.children.is_empty() {
            return writeln!(f, " />");
        }
        writeln!(f, ">")?;
        for child in &self.children {
            child.write_indented(f, depth.saturating_add(1))?;
        }
        writeln!(f, "{indent}</{}>", self.qualified_name())
    }
}

/// Renders the tree as indented markup, for logs and diagnostics.
impl fmt::Display for ConfigNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}
