//! Capability map.
//!
//! The map from capability to implementation is an immutable snapshot behind
//! an [`ArcSwap`]. Readers load the current snapshot without locking; writers
//! build a new map from the snapshot they observed and publish it with a
//! compare-and-swap, retrying against the latest snapshot if another writer
//! got there first. No writer's registrations are lost, but the winner for a
//! capability registered concurrently by two writers is unspecified.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, info};

use crate::capability::CapabilityId;
use crate::descriptor::{CapabilityDescriptor, Implementation};

/// Immutable capability map snapshot.
pub type CapabilitySnapshot = HashMap<CapabilityId, Arc<Implementation>>;

/// Lock-free registry of capability implementations.
pub struct CapabilityRegistry {
    snapshot: ArcSwap<CapabilitySnapshot>,
}

impl CapabilityRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Publish `descriptors` into the map.
    ///
    /// Within one call the last descriptor for a capability wins. Returns the
    /// non-lazy capabilities whose winning descriptor asked for immediate
    /// construction, in registration order.
    pub fn publish(&self, descriptors: &[CapabilityDescriptor]) -> Vec<CapabilityId> {
        let mut order: Vec<CapabilityId> = Vec::with_capacity(descriptors.len());
        let mut winners: HashMap<CapabilityId, &CapabilityDescriptor> =
            HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            if winners.insert(descriptor.capability(), descriptor).is_none() {
                order.push(descriptor.capability());
            }
        }

        let replaced = self.swap_with(|next| {
            let mut replaced = Vec::new();
            for capability in &order {
                let implementation = Arc::clone(winners[capability].implementation());
                let new_name = implementation.name();
                if let Some(previous) = next.insert(*capability, implementation)
                    && previous.name() != new_name
                {
                    replaced.push((*capability, previous.name(), new_name));
                }
            }
            replaced
        });

        for (capability, previous, current) in replaced {
            info!(
                capability = %capability,
                previous,
                current,
                "replaced registered implementation"
            );
        }
        debug!(count = order.len(), "published capability registrations");

        order
            .into_iter()
            .filter(|capability| !winners[capability].is_lazy())
            .collect()
    }

    /// Force `implementation` into the map for `capability`.
    ///
    /// Returns the implementation it replaced, if any.
    pub fn insert(
        &self,
        capability: CapabilityId,
        implementation: Arc<Implementation>,
    ) -> Option<Arc<Implementation>> {
        self.swap_with(|next| next.insert(capability, Arc::clone(&implementation)))
    }

    /// The implementation currently registered for `capability`.
    #[must_use]
    pub fn implementation_of(&self, capability: CapabilityId) -> Option<Arc<Implementation>> {
        self.snapshot.load().get(&capability).cloned()
    }

    /// Whether `capability` has a registered implementation.
    #[must_use]
    pub fn contains(&self, capability: CapabilityId) -> bool {
        self.snapshot.load().contains_key(&capability)
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CapabilitySnapshot> {
        self.snapshot.load_full()
    }

    /// Number of registered capabilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    /// Whether no capability is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot.load().is_empty()
    }

    /// Apply `update` to a copy of the current snapshot and publish it,
    /// retrying from the latest snapshot until the swap succeeds.
    fn swap_with<R>(&self, mut update: impl FnMut(&mut CapabilitySnapshot) -> R) -> R {
        loop {
            let current = self.snapshot.load_full();
            let mut next = (*current).clone();
            let result = update(&mut next);

            let previous = self.snapshot.compare_and_swap(&current, Arc::new(next));
            if Arc::ptr_eq(&previous, &current) {
                return result;
            }
            debug!("capability map changed during publish; retrying");
        }
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;

    use super::*;
    use crate::descriptor::Registration;

    trait Transport: Send + Sync {
        fn kind(&self) -> &'static str;
    }

    struct Tcp;
    struct Quic;

    impl Transport for Tcp {
        fn kind(&self) -> &'static str {
            "tcp"
        }
    }

    impl Transport for Quic {
        fn kind(&self) -> &'static str {
            "quic"
        }
    }

    fn tcp() -> CapabilityDescriptor {
        Registration::<dyn Transport>::implemented_by::<Tcp>()
            .constructor([], |_| Ok(Arc::new(Tcp) as Arc<dyn Transport>))
            .build()
    }

    fn quic() -> CapabilityDescriptor {
        Registration::<dyn Transport>::implemented_by::<Quic>()
            .eager()
            .constructor([], |_| Ok(Arc::new(Quic) as Arc<dyn Transport>))
            .build()
    }

    #[test]
    fn test_publish_and_lookup() {
        let registry = CapabilityRegistry::new();
        assert!(registry.is_empty());

        let eager = registry.publish(&[tcp()]);
        assert!(eager.is_empty());
        assert!(registry.contains(CapabilityId::of::<dyn Transport>()));

        let implementation = registry
            .implementation_of(CapabilityId::of::<dyn Transport>())
            .unwrap();
        assert!(implementation.name().ends_with("Tcp"));
    }

    #[test]
    fn test_last_descriptor_wins_within_one_publish() {
        let registry = CapabilityRegistry::new();
        let eager = registry.publish(&[tcp(), quic()]);

        assert_eq!(registry.len(), 1);
        assert_eq!(eager, vec![CapabilityId::of::<dyn Transport>()]);
        let implementation = registry
            .implementation_of(CapabilityId::of::<dyn Transport>())
            .unwrap();
        assert!(implementation.name().ends_with("Quic"));
    }

    #[test]
    fn test_later_publish_replaces() {
        let registry = CapabilityRegistry::new();
        registry.publish(&[quic()]);
        registry.publish(&[tcp()]);

        let implementation = registry
            .implementation_of(CapabilityId::of::<dyn Transport>())
            .unwrap();
        assert!(implementation.name().ends_with("Tcp"));
    }

    #[test]
    fn test_insert_returns_previous() {
        let registry = CapabilityRegistry::new();
        registry.publish(&[tcp()]);

        let quic = quic();
        let previous = registry
            .insert(quic.capability(), Arc::clone(quic.implementation()))
            .unwrap();
        assert!(previous.name().ends_with("Tcp"));
    }

    #[test]
    fn test_snapshot_is_immutable() {
        let registry = CapabilityRegistry::new();
        let before = registry.snapshot();
        registry.publish(&[tcp()]);

        assert!(before.is_empty());
        assert_eq!(registry.snapshot().len(), 1);
    }

    macro_rules! capabilities {
        ($($name:ident),*) => {
            $(
                trait $name: Send + Sync {}
                impl $name for Tcp {}
            )*

            fn all_descriptors() -> Vec<CapabilityDescriptor> {
                vec![$(
                    Registration::<dyn $name>::implemented_by::<Tcp>()
                        .constructor([], |_| Ok(Arc::new(Tcp) as Arc<dyn $name>))
                        .build()
                ),*]
            }
        };
    }

    capabilities!(C0, C1, C2, C3, C4, C5, C6, C7);

    #[test]
    fn test_concurrent_publishers_lose_nothing() {
        let registry = CapabilityRegistry::new();
        let descriptors = all_descriptors();
        let barrier = Barrier::new(descriptors.len());

        std::thread::scope(|scope| {
            for descriptor in &descriptors {
                let registry = &registry;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    registry.publish(std::slice::from_ref(descriptor));
                });
            }
        });

        assert_eq!(registry.len(), descriptors.len());
        for descriptor in &descriptors {
            assert!(registry.contains(descriptor.capability()));
        }
    }

    #[test]
    fn test_transport_kind() {
        assert_eq!(Tcp.kind(), "tcp");
        assert_eq!(Quic.kind(), "quic");
    }
}
