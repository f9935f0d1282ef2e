//! Deployment role tags.

use std::fmt;

/// A deployment role, such as `Cluster.Server`.
///
/// The tag is the dotted form used as an element name in configuration
/// documents. Its identifier form (`Cluster_Server`) replaces every dot with
/// an underscore, so it can name enum variants, environment variables and
/// the like.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoleTag(String);

impl RoleTag {
    /// Create a role from its dotted tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Create a role from its underscore identifier.
    #[must_use]
    pub fn from_identifier(identifier: &str) -> Self {
        Self(identifier.replace('_', "."))
    }

    /// The underscore identifier of this role.
    #[must_use]
    pub fn to_identifier(&self) -> String {
        self.0.replace('.', "_")
    }

    /// The dotted tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RoleTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoleTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}
