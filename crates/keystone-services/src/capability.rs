//! Capability and implementation identities.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of a capability contract.
///
/// A capability is usually a trait object type such as `dyn Storage`, but any
/// `'static` type can serve as one. Equality and hashing use the [`TypeId`];
/// the type name is carried for diagnostics.
#[derive(Clone, Copy)]
pub struct CapabilityId {
    type_id: TypeId,
    name: &'static str,
}

impl CapabilityId {
    /// Identity of capability `C`.
    #[must_use]
    pub fn of<C: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
        }
    }

    /// Fully qualified type name of the capability.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for CapabilityId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for CapabilityId {}

impl Hash for CapabilityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CapabilityId").field(&self.name).finish()
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Identity of an implementation type.
#[derive(Clone, Copy)]
pub struct ImplementationId {
    type_id: TypeId,
    name: &'static str,
}

impl ImplementationId {
    /// Identity of implementation type `I`.
    #[must_use]
    pub fn of<I: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<I>(),
            name: std::any::type_name::<I>(),
        }
    }

    /// Fully qualified type name of the implementation.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ImplementationId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ImplementationId {}

impl fmt::Debug for ImplementationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ImplementationId").field(&self.name).finish()
    }
}

/// A constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    /// A capability the container resolves.
    Capability(CapabilityId),
    /// A plain value the container cannot supply.
    Value(&'static str),
}

impl Param {
    /// A parameter resolved as capability `C`.
    #[must_use]
    pub fn capability<C: ?Sized + 'static>() -> Self {
        Self::Capability(CapabilityId::of::<C>())
    }

    /// A plain value parameter of type `T`.
    #[must_use]
    pub fn value<T: ?Sized>() -> Self {
        Self::Value(std::any::type_name::<T>())
    }

    /// The capability behind this parameter, if it is one.
    #[must_use]
    pub fn as_capability(&self) -> Option<CapabilityId> {
        match self {
            Self::Capability(id) => Some(*id),
            Self::Value(_) => None,
        }
    }
}

/// A type-erased singleton. Always wraps an `Arc<C>` for its capability `C`.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

pub(crate) fn erase<C: ?Sized + Send + Sync + 'static>(instance: Arc<C>) -> Instance {
    Arc::new(instance)
}

pub(crate) fn downcast<C: ?Sized + Send + Sync + 'static>(instance: &Instance) -> Option<Arc<C>> {
    instance.downcast_ref::<Arc<C>>().cloned()
}
