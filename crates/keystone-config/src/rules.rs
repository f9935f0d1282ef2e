//! Merge rules: which roles exist and which element accumulates overrides.

use crate::names;
use crate::role::RoleTag;

/// Parameters of the role merge and per-node generation.
///
/// ```rust
/// use keystone_config::{MergeRules, RoleTag};
///
/// let rules = MergeRules::default()
///     .with_role(RoleTag::from_identifier("Cluster_Server"))
///     .with_role(RoleTag::new("Cluster.Client"));
///
/// assert!(rules.selects("*", rules.roles().first().unwrap()));
/// assert!(rules.selects("Cluster.Server, Gateway", &RoleTag::new("Gateway")));
/// assert!(!rules.selects("Gateway", &RoleTag::new("Cluster.Client")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRules {
    roles: Vec<RoleTag>,
    wildcard: String,
    runtime_element: String,
}

impl Default for MergeRules {
    fn default() -> Self {
        Self {
            roles: Vec::new(),
            wildcard: names::WILDCARD.to_owned(),
            runtime_element: names::ACTOR_RUNTIME.to_owned(),
        }
    }
}

impl MergeRules {
    /// Rules with the given roles and default constants.
    #[must_use]
    pub fn new(roles: impl IntoIterator<Item = RoleTag>) -> Self {
        Self::default().with_roles(roles)
    }

    /// Declare a role. Declaring the same role twice has no effect.
    #[must_use]
    pub fn with_role(mut self, role: RoleTag) -> Self {
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    /// Declare several roles.
    #[must_use]
    pub fn with_roles(self, roles: impl IntoIterator<Item = RoleTag>) -> Self {
        roles.into_iter().fold(self, Self::with_role)
    }

    /// Override the `With` value that selects every role.
    #[must_use]
    pub fn with_wildcard(mut self, wildcard: impl Into<String>) -> Self {
        self.wildcard = wildcard.into();
        self
    }

    /// Override the name of the element whose per-node settings accumulate.
    #[must_use]
    pub fn with_runtime_element(mut self, name: impl Into<String>) -> Self {
        self.runtime_element = name.into();
        self
    }

    /// Declared roles, in declaration order.
    #[must_use]
    pub fn roles(&self) -> &[RoleTag] {
        &self.roles
    }

    /// The wildcard `With` value.
    #[must_use]
    pub fn wildcard(&self) -> &str {
        &self.wildcard
    }

    /// Name of the reserved runtime element.
    #[must_use]
    pub fn runtime_element(&self) -> &str {
        &self.runtime_element
    }

    /// Whether a `Shared` block's `With` value selects `role`.
    #[must_use]
    pub fn selects(&self, with: &str, role: &RoleTag) -> bool {
        let with = with.trim();
        with == self.wildcard || with.split(',').any(|tag| tag.trim() == role.as_str())
    }
}
