//! Service modules: named registration tables.

use crate::descriptor::CapabilityDescriptor;

/// A unit of service registrations, such as the services one crate provides.
///
/// Modules are the explicit counterpart of scanning loaded code for marked
/// implementations: [`ServiceContainer::rescan`](crate::ServiceContainer::rescan)
/// asks each module for its table and registers whatever is new.
pub trait ServiceModule: Send + Sync {
    /// Module name, used in logs.
    fn name(&self) -> &str;

    /// The module's registration table.
    fn descriptors(&self) -> Vec<CapabilityDescriptor>;
}

/// A [`ServiceModule`] backed by a fixed list of descriptors.
#[derive(Debug, Clone)]
pub struct ServiceTable {
    name: String,
    descriptors: Vec<CapabilityDescriptor>,
}

impl ServiceTable {
    /// Create an empty table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptors: Vec::new(),
        }
    }

    /// Add a descriptor.
    #[must_use]
    pub fn with(mut self, descriptor: CapabilityDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Number of descriptors in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl ServiceModule for ServiceTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptors(&self) -> Vec<CapabilityDescriptor> {
        self.descriptors.clone()
    }
}
