//! Exactly-once lazy construction of singleton services.
//!
//! # Resolution
//!
//! [`ServiceContainer::get`] resolves a capability in four steps:
//!
//! 1. The clock capability is answered directly from the container.
//! 2. A cached outcome (instance or error) is returned as-is.
//! 3. Otherwise the implementation is looked up in the [`CapabilityRegistry`];
//!    a missing one fails with [`ServiceError::UnregisteredCapability`].
//! 4. The caller tries to claim the capability. The claimant resolves the
//!    selected constructor's dependencies depth-first, invokes it, caches the
//!    outcome and signals completion. Everyone else waits on that signal.
//!
//! Claims are never released, so a constructor runs at most once per
//! container even when it fails. Failures are cached and handed to every
//! later caller. Before anything is claimed, the dependency graph reachable
//! from the requested capability is walked so that a cycle fails fast with
//! [`ServiceError::CyclicDependency`] instead of leaving claimants waiting on
//! each other.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, error, info, warn};

use crate::capability::{CapabilityId, Instance, downcast, erase};
use crate::clock::{Clock, SystemClock};
use crate::descriptor::{CapabilityDescriptor, Dependencies, Implementation};
use crate::error::{ServiceError, ServiceResult};
use crate::module::ServiceModule;
use crate::registry::{CapabilityRegistry, CapabilitySnapshot};
use crate::resolver::select_constructor;

/// Cached result of constructing a capability.
type Outcome = Result<Instance, ServiceError>;

/// One-shot completion signal for a claimed capability.
#[derive(Default)]
struct Completion {
    done: OnceLock<()>,
}

impl Completion {
    fn signal(&self) {
        let _ = self.done.set(());
    }

    fn wait(&self) {
        self.done.wait();
    }
}

enum Claim {
    Won(Arc<Completion>),
    Lost(Arc<Completion>),
}

/// Process-wide service container.
///
/// Holds the capability map, the instance cache and the claim set. It is
/// `Send + Sync` and meant to be shared behind an `Arc`.
pub struct ServiceContainer {
    registry: CapabilityRegistry,
    instances: DashMap<CapabilityId, Outcome>,
    claims: DashMap<CapabilityId, Arc<Completion>>,
    clock: Arc<dyn Clock>,
    sealed: AtomicBool,
}

impl ServiceContainer {
    /// Create an empty container using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty container that answers `dyn Clock` with `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: CapabilityRegistry::new(),
            instances: DashMap::new(),
            claims: DashMap::new(),
            clock,
            sealed: AtomicBool::new(false),
        }
    }

    /// Capability the container resolves itself.
    #[must_use]
    pub fn clock_capability() -> CapabilityId {
        CapabilityId::of::<dyn Clock>()
    }

    /// Register descriptors, then construct the non-lazy ones.
    ///
    /// Registration itself never fails. Failures of eager construction are
    /// logged and cached like any other construction failure.
    pub fn register<I>(&self, descriptors: I)
    where
        I: IntoIterator<Item = CapabilityDescriptor>,
    {
        let descriptors: Vec<CapabilityDescriptor> = descriptors.into_iter().collect();
        let eager = self.registry.publish(&descriptors);

        for capability in eager {
            if let Err(e) = self.resolve(capability, false) {
                warn!(capability = %capability, error = %e, "eager construction failed");
            }
        }
    }

    /// Collect descriptors from `modules` and register the ones not already known.
    ///
    /// A descriptor is new if its capability is unregistered or currently
    /// mapped to a different implementation. Returns how many were registered.
    pub fn rescan(&self, modules: &[&dyn ServiceModule]) -> usize {
        let snapshot = self.registry.snapshot();
        let mut fresh = Vec::new();

        for module in modules {
            let before = fresh.len();
            fresh.extend(module.descriptors().into_iter().filter(|descriptor| {
                snapshot
                    .get(&descriptor.capability())
                    .is_none_or(|known| known.id() != descriptor.implementation().id())
            }));
            debug!(
                module = module.name(),
                found = fresh.len().saturating_sub(before),
                "scanned service module"
            );
        }

        let count = fresh.len();
        if count > 0 {
            self.register(fresh);
        }
        info!(count, "rescan registered new implementations");
        count
    }

    /// Resolve capability `C`, constructing it and its dependencies if needed.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::UnregisteredCapability`] if nothing provides `C`.
    /// - [`ServiceError::CyclicDependency`] if `C`'s dependency graph has a cycle.
    /// - [`ServiceError::NoEligibleConstructor`], [`ServiceError::ConstructionFailed`]
    ///   or [`ServiceError::ConstructionPanicked`] if construction of `C` or one
    ///   of its dependencies failed; the error is cached and repeated.
    pub fn get<C: ?Sized + Send + Sync + 'static>(&self) -> ServiceResult<Arc<C>> {
        let capability = CapabilityId::of::<C>();
        let instance = self.resolve(capability, false)?;
        downcast::<C>(&instance).ok_or(ServiceError::TypeMismatch {
            capability: capability.name(),
        })
    }

    /// Pin `instance` as the provider of capability `C`.
    ///
    /// Overwrites both the capability map and the instance cache, bypassing
    /// construction. Only allowed until [`seal`](Self::seal) is called.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::BootstrapClosed`] once the container is sealed.
    /// - [`ServiceError::ReservedCapability`] for the clock capability.
    pub fn set_capability<C: ?Sized + Send + Sync + 'static>(
        &self,
        instance: Arc<C>,
    ) -> ServiceResult<()> {
        let capability = CapabilityId::of::<C>();
        if self.is_sealed() {
            return Err(ServiceError::BootstrapClosed {
                capability: capability.name(),
            });
        }
        if capability == Self::clock_capability() {
            return Err(ServiceError::ReservedCapability {
                capability: capability.name(),
            });
        }

        let implementation = Arc::new(Implementation::pinned(Arc::clone(&instance)));
        if let Some(previous) = self.registry.insert(capability, implementation) {
            info!(
                capability = %capability,
                previous = previous.name(),
                "pinned instance replaces registered implementation"
            );
        }

        self.instances.insert(capability, Ok(erase(instance)));
        self.claims
            .entry(capability)
            .or_insert_with(|| Arc::new(Completion::default()))
            .signal();
        Ok(())
    }

    /// Close the bootstrap window; later [`set_capability`](Self::set_capability)
    /// calls fail.
    pub fn seal(&self) {
        if !self.sealed.swap(true, Ordering::AcqRel) {
            info!(capabilities = self.registry.len(), "service container sealed");
        }
    }

    /// Whether [`seal`](Self::seal) has been called.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// Whether capability `C` has a registered or pinned implementation.
    #[must_use]
    pub fn is_registered<C: ?Sized + 'static>(&self) -> bool {
        self.registry.contains(CapabilityId::of::<C>())
    }

    /// Whether capability `C` has a cached outcome.
    #[must_use]
    pub fn is_constructed<C: ?Sized + 'static>(&self) -> bool {
        self.instances.contains_key(&CapabilityId::of::<C>())
    }

    /// Type name of the implementation registered for capability `C`.
    #[must_use]
    pub fn implementation_of<C: ?Sized + 'static>(&self) -> Option<&'static str> {
        self.registry
            .implementation_of(CapabilityId::of::<C>())
            .map(|implementation| implementation.name())
    }

    /// All registered capabilities, sorted by name.
    #[must_use]
    pub fn registered_capabilities(&self) -> Vec<CapabilityId> {
        let mut capabilities: Vec<CapabilityId> =
            self.registry.snapshot().keys().copied().collect();
        capabilities.sort_by_key(CapabilityId::name);
        capabilities
    }

    /// The container's clock.
    #[must_use]
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Resolve `capability`. `acyclic` is true when a caller higher up the
    /// same resolution already walked this part of the graph.
    fn resolve(&self, capability: CapabilityId, acyclic: bool) -> Outcome {
        if capability == Self::clock_capability() {
            return Ok(erase(Arc::clone(&self.clock)));
        }
        if let Some(outcome) = self.cached(capability) {
            return outcome;
        }

        let implementation = self.registry.implementation_of(capability).ok_or(
            ServiceError::UnregisteredCapability {
                capability: capability.name(),
            },
        )?;
        if !acyclic {
            self.ensure_acyclic(capability)?;
        }

        match self.claim(capability) {
            Claim::Won(completion) => {
                let guard = ClaimGuard {
                    container: self,
                    capability,
                    implementation: implementation.name(),
                    completion,
                    finished: false,
                };
                let outcome = self.construct(capability, &implementation);
                guard.finish(outcome)
            },
            Claim::Lost(completion) => {
                completion.wait();
                self.cached(capability)
                    .unwrap_or(Err(ServiceError::ConstructionPanicked {
                        capability: capability.name(),
                        implementation: implementation.name(),
                    }))
            },
        }
    }

    fn cached(&self, capability: CapabilityId) -> Option<Outcome> {
        self.instances
            .get(&capability)
            .map(|entry| entry.value().clone())
    }

    fn claim(&self, capability: CapabilityId) -> Claim {
        match self.claims.entry(capability) {
            Entry::Occupied(entry) => Claim::Lost(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let completion = Arc::new(Completion::default());
                entry.insert(Arc::clone(&completion));
                Claim::Won(completion)
            },
        }
    }

    /// Build `capability` from its selected constructor. Runs only on the
    /// claimant's call path.
    fn construct(&self, capability: CapabilityId, implementation: &Implementation) -> Outcome {
        let constructor = select_constructor(implementation)?;

        let mut resolved = Vec::with_capacity(constructor.arity());
        for dependency in constructor.capabilities() {
            resolved.push((dependency, self.resolve(dependency, true)?));
        }

        debug!(
            capability = %capability,
            implementation = implementation.name(),
            dependencies = resolved.len(),
            "constructing service"
        );
        constructor
            .invoke(&Dependencies::new(resolved))
            .map_err(|source| {
                error!(
                    capability = %capability,
                    implementation = implementation.name(),
                    error = %source,
                    "service construction failed"
                );
                ServiceError::ConstructionFailed {
                    capability: capability.name(),
                    implementation: implementation.name(),
                    source: Arc::from(source),
                }
            })
    }

    /// Walk the selected constructors reachable from `root` looking for a cycle.
    ///
    /// Capabilities that are already cached, unregistered, or have no
    /// eligible constructor end the walk along their branch; their errors
    /// surface during construction instead.
    fn ensure_acyclic(&self, root: CapabilityId) -> ServiceResult<()> {
        let snapshot = self.registry.snapshot();
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        self.visit(&snapshot, root, &mut path, &mut visited)
    }

    fn visit(
        &self,
        snapshot: &CapabilitySnapshot,
        capability: CapabilityId,
        path: &mut Vec<CapabilityId>,
        visited: &mut HashSet<CapabilityId>,
    ) -> ServiceResult<()> {
        if let Some(start) = path.iter().position(|step| *step == capability) {
            let mut cycle: Vec<&'static str> =
                path[start..].iter().map(CapabilityId::name).collect();
            cycle.push(capability.name());
            return Err(ServiceError::CyclicDependency { path: cycle });
        }
        if visited.contains(&capability)
            || capability == Self::clock_capability()
            || self.instances.contains_key(&capability)
        {
            return Ok(());
        }
        let Some(implementation) = snapshot.get(&capability) else {
            return Ok(());
        };
        let Ok(constructor) = select_constructor(implementation) else {
            return Ok(());
        };

        path.push(capability);
        for dependency in constructor.capabilities() {
            self.visit(snapshot, dependency, path, visited)?;
        }
        path.pop();
        visited.insert(capability);
        Ok(())
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new()
    }
}

/// Publishes the claimant's outcome exactly once, even if the factory panics.
struct ClaimGuard<'a> {
    container: &'a ServiceContainer,
    capability: CapabilityId,
    implementation: &'static str,
    completion: Arc<Completion>,
    finished: bool,
}

impl ClaimGuard<'_> {
    fn finish(mut self, outcome: Outcome) -> Outcome {
        self.finished = true;
        self.publish(outcome)
    }

    /// Store `outcome` unless an instance was pinned meanwhile, then wake waiters.
    fn publish(&self, outcome: Outcome) -> Outcome {
        let stored = self
            .container
            .instances
            .entry(self.capability)
            .or_insert(outcome)
            .value()
            .clone();
        self.completion.signal();
        stored
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        error!(
            capability = %self.capability,
            implementation = self.implementation,
            "service construction panicked"
        );
        let _ = self.publish(Err(ServiceError::ConstructionPanicked {
            capability: self.capability.name(),
            implementation: self.implementation,
        }));
    }
}
