//! Registration table entries.
//!
//! Implementations are declared explicitly rather than discovered: each
//! [`CapabilityDescriptor`] names the capability it provides, the
//! implementation type, whether it is lazy, and one or more constructors.
//! A constructor is a parameter list plus a factory closure, so the whole
//! dependency graph can be inspected before anything is built.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::capability::{CapabilityId, ImplementationId, Instance, Param, downcast, erase};
use crate::error::{BoxError, ServiceError, ServiceResult};

type Factory = dyn Fn(&Dependencies) -> Result<Instance, BoxError> + Send + Sync;

/// One way to build an implementation.
#[derive(Clone)]
pub struct Constructor {
    params: Vec<Param>,
    factory: Arc<Factory>,
}

impl Constructor {
    /// Declared parameters, in call order.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Number of parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Capabilities among the parameters, in call order.
    pub fn capabilities(&self) -> impl Iterator<Item = CapabilityId> + '_ {
        self.params.iter().filter_map(Param::as_capability)
    }

    pub(crate) fn invoke(&self, dependencies: &Dependencies) -> Result<Instance, BoxError> {
        (self.factory)(dependencies)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// An implementation type and the constructors it offers.
#[derive(Debug)]
pub struct Implementation {
    id: ImplementationId,
    constructors: Vec<Constructor>,
}

impl Implementation {
    /// Identity of the implementation type.
    #[must_use]
    pub fn id(&self) -> ImplementationId {
        self.id
    }

    /// Type name of the implementation.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    /// Constructors in declaration order.
    #[must_use]
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// An implementation that hands out an already-built instance.
    pub(crate) fn pinned<C: ?Sized + Send + Sync + 'static>(instance: Arc<C>) -> Self {
        let factory: Arc<Factory> =
            Arc::new(move |_: &Dependencies| Ok(erase(Arc::clone(&instance))));
        Self {
            id: ImplementationId::of::<Arc<C>>(),
            constructors: vec![Constructor {
                params: Vec::new(),
                factory,
            }],
        }
    }
}

/// A registration table entry: capability, implementation, laziness.
#[derive(Debug, Clone)]
pub struct CapabilityDescriptor {
    capability: CapabilityId,
    implementation: Arc<Implementation>,
    lazy: bool,
}

impl CapabilityDescriptor {
    /// The capability this entry provides.
    #[must_use]
    pub fn capability(&self) -> CapabilityId {
        self.capability
    }

    /// The implementation that provides it.
    #[must_use]
    pub fn implementation(&self) -> &Arc<Implementation> {
        &self.implementation
    }

    /// Whether construction waits for the first request.
    #[must_use]
    pub fn is_lazy(&self) -> bool {
        self.lazy
    }
}

/// Typed builder for a [`CapabilityDescriptor`] providing capability `C`.
///
/// ```rust
/// use std::sync::Arc;
/// use keystone_services::{Clock, Param, Registration};
///
/// trait Heartbeat: Send + Sync {}
/// struct ClockedHeartbeat(Arc<dyn Clock>);
/// impl Heartbeat for ClockedHeartbeat {}
///
/// let descriptor = Registration::<dyn Heartbeat>::implemented_by::<ClockedHeartbeat>()
///     .constructor([Param::capability::<dyn Clock>()], |deps| {
///         let clock = deps.get::<dyn Clock>()?;
///         Ok(Arc::new(ClockedHeartbeat(clock)) as Arc<dyn Heartbeat>)
///     })
///     .build();
/// assert!(descriptor.is_lazy());
/// ```
pub struct Registration<C: ?Sized> {
    implementation: ImplementationId,
    lazy: bool,
    constructors: Vec<Constructor>,
    _capability: PhantomData<fn() -> Arc<C>>,
}

impl<C: ?Sized + Send + Sync + 'static> Registration<C> {
    /// Start a lazy registration of implementation type `I` for capability `C`.
    #[must_use]
    pub fn implemented_by<I: 'static>() -> Self {
        Self {
            implementation: ImplementationId::of::<I>(),
            lazy: true,
            constructors: Vec::new(),
            _capability: PhantomData,
        }
    }

    /// Construct as soon as the registration is published.
    #[must_use]
    pub fn eager(self) -> Self {
        self.lazy(false)
    }

    /// Set whether construction waits for the first request.
    #[must_use]
    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// Add a constructor with the given parameters.
    #[must_use]
    pub fn constructor<P, F>(mut self, params: P, factory: F) -> Self
    where
        P: IntoIterator<Item = Param>,
        F: Fn(&Dependencies) -> Result<Arc<C>, BoxError> + Send + Sync + 'static,
    {
        let factory: Arc<Factory> =
            Arc::new(move |deps: &Dependencies| factory(deps).map(erase::<C>));
        self.constructors.push(Constructor {
            params: params.into_iter().collect(),
            factory,
        });
        self
    }

    /// Finish the registration.
    #[must_use]
    pub fn build(self) -> CapabilityDescriptor {
        CapabilityDescriptor {
            capability: CapabilityId::of::<C>(),
            implementation: Arc::new(Implementation {
                id: self.implementation,
                constructors: self.constructors,
            }),
            lazy: self.lazy,
        }
    }
}

/// Resolved arguments handed to a factory, in parameter order.
pub struct Dependencies {
    resolved: Vec<(CapabilityId, Instance)>,
}

impl Dependencies {
    pub(crate) fn new(resolved: Vec<(CapabilityId, Instance)>) -> Self {
        Self { resolved }
    }

    /// Fetch the resolved instance of capability `D`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MissingDependency`] if `D` was not a declared
    /// parameter of the constructor being invoked.
    pub fn get<D: ?Sized + Send + Sync + 'static>(&self) -> ServiceResult<Arc<D>> {
        let wanted = CapabilityId::of::<D>();
        self.resolved
            .iter()
            .find(|(id, _)| *id == wanted)
            .and_then(|(_, instance)| downcast::<D>(instance))
            .ok_or(ServiceError::MissingDependency {
                capability: wanted.name(),
            })
    }

    /// Resolved capabilities in parameter order.
    pub fn capabilities(&self) -> impl Iterator<Item = CapabilityId> + '_ {
        self.resolved.iter().map(|(id, _)| *id)
    }

    /// Number of resolved arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    /// Whether the constructor takes no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}
