//! Mock collaborators.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, TimeZone, Utc};
use keystone_config::AddressResolver;
use keystone_services::{BoxError, Clock, Dependencies};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---- Clock ----

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Clock frozen at `now`.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Clock frozen at 2026-01-01T00:00:00Z.
    ///
    /// # Panics
    ///
    /// Never; the instant is a valid UTC time.
    #[must_use]
    pub fn epoch() -> Self {
        Self::at(
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
                .single()
                .expect("valid fixed instant"),
        )
    }

    /// Move the clock forward by `by`.
    ///
    /// # Panics
    ///
    /// Panics if the result is out of the representable range.
    pub fn advance(&self, by: Duration) {
        let mut now = lock(&self.now);
        *now = now.checked_add_signed(by).expect("clock overflow");
    }

    /// Jump to `instant`.
    pub fn set(&self, instant: DateTime<Utc>) {
        *lock(&self.now) = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.now)
    }
}

// ---- Address resolver ----

/// An [`AddressResolver`] reporting a fixed list of addresses.
#[derive(Debug, Clone, Default)]
pub struct FixedAddressResolver {
    addresses: Vec<Ipv4Addr>,
}

impl FixedAddressResolver {
    /// Resolver reporting `addresses`.
    #[must_use]
    pub fn new(addresses: impl IntoIterator<Item = Ipv4Addr>) -> Self {
        Self {
            addresses: addresses.into_iter().collect(),
        }
    }

    /// Resolver reporting exactly one address.
    #[must_use]
    pub fn single(octets: [u8; 4]) -> Self {
        Self::new([Ipv4Addr::from(octets)])
    }

    /// Resolver reporting no addresses.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

impl AddressResolver for FixedAddressResolver {
    fn local_ipv4_addresses(&self) -> Vec<Ipv4Addr> {
        self.addresses.clone()
    }
}

// ---- Construction probe ----

/// Records factory invocations: how often each ran and in which order.
///
/// Clones share the same record, so one probe can be handed to several
/// factories and inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct CountingFactory {
    order: Arc<Mutex<Vec<&'static str>>>,
    calls: Arc<Mutex<HashMap<&'static str, usize>>>,
}

impl CountingFactory {
    /// A fresh probe.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one invocation of `label`.
    pub fn record(&self, label: &'static str) {
        lock(&self.order).push(label);
        let mut calls = lock(&self.calls);
        let count = calls.entry(label).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Wrap `factory` so every invocation is recorded as `label` before it runs.
    pub fn wrap<C, F>(
        &self,
        label: &'static str,
        factory: F,
    ) -> Box<dyn Fn(&Dependencies) -> Result<Arc<C>, BoxError> + Send + Sync>
    where
        C: ?Sized + 'static,
        F: Fn(&Dependencies) -> Result<Arc<C>, BoxError> + Send + Sync + 'static,
    {
        let probe = self.clone();
        Box::new(move |deps: &Dependencies| {
            probe.record(label);
            factory(deps)
        })
    }

    /// How many times `label` was recorded.
    #[must_use]
    pub fn calls(&self, label: &str) -> usize {
        lock(&self.calls).get(label).copied().unwrap_or(0)
    }

    /// Total recorded invocations.
    #[must_use]
    pub fn total(&self) -> usize {
        lock(&self.order).len()
    }

    /// Labels in invocation order.
    #[must_use]
    pub fn order(&self) -> Vec<&'static str> {
        lock(&self.order).clone()
    }

    /// Whether `first` was recorded before `second`.
    #[must_use]
    pub fn ran_before(&self, first: &str, second: &str) -> bool {
        let order = lock(&self.order);
        match (
            order.iter().position(|l| *l == first),
            order.iter().position(|l| *l == second),
        ) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::epoch();
        let start = clock.now();

        clock.advance(Duration::minutes(5));
        assert_eq!(clock.now().signed_duration_since(start), Duration::minutes(5));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_fixed_resolver() {
        assert!(FixedAddressResolver::none().local_ipv4_addresses().is_empty());
        assert_eq!(
            FixedAddressResolver::single([10, 0, 0, 2]).local_ipv4_addresses(),
            vec![Ipv4Addr::new(10, 0, 0, 2)]
        );
    }

    #[test]
    fn test_counting_factory() {
        let probe = CountingFactory::new();
        let shared = probe.clone();

        probe.record("storage");
        shared.record("directory");
        probe.record("storage");

        assert_eq!(probe.calls("storage"), 2);
        assert_eq!(probe.calls("directory"), 1);
        assert_eq!(probe.calls("gateway"), 0);
        assert_eq!(probe.total(), 3);
        assert_eq!(probe.order(), vec!["storage", "directory", "storage"]);
        assert!(probe.ran_before("storage", "directory"));
        assert!(!probe.ran_before("directory", "gateway"));
    }
}
