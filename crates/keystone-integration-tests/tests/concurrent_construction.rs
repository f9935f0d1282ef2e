//! Exactly-once construction across threads and tasks.
//!
//! Uses a diamond-shaped service graph:
//!
//! ```text
//!          Gateway
//!         /       \
//!     Index       Cache
//!         \       /
//!          Journal
//!             |
//!           Clock
//! ```

use std::sync::{Arc, Barrier};
use std::time::Duration;

use chrono::{DateTime, Utc};
use keystone_services::{
    BoxError, CapabilityDescriptor, Clock, Param, Registration, ServiceContainer, ServiceError,
};
use keystone_test::{CountingFactory, ManualClock, init_test_logging};

trait Journal: Send + Sync {
    fn opened_at(&self) -> DateTime<Utc>;
}
trait Index: Send + Sync {
    fn journal(&self) -> Arc<dyn Journal>;
}
trait Cache: Send + Sync {
    fn journal(&self) -> Arc<dyn Journal>;
}
trait Gateway: Send + Sync {
    fn index(&self) -> Arc<dyn Index>;
    fn cache(&self) -> Arc<dyn Cache>;
}

struct FileJournal(DateTime<Utc>);
impl Journal for FileJournal {
    fn opened_at(&self) -> DateTime<Utc> {
        self.0
    }
}

struct JournalIndex(Arc<dyn Journal>);
impl Index for JournalIndex {
    fn journal(&self) -> Arc<dyn Journal> {
        Arc::clone(&self.0)
    }
}

struct JournalCache(Arc<dyn Journal>);
impl Cache for JournalCache {
    fn journal(&self) -> Arc<dyn Journal> {
        Arc::clone(&self.0)
    }
}

struct HttpGateway {
    index: Arc<dyn Index>,
    cache: Arc<dyn Cache>,
}
impl Gateway for HttpGateway {
    fn index(&self) -> Arc<dyn Index> {
        Arc::clone(&self.index)
    }
    fn cache(&self) -> Arc<dyn Cache> {
        Arc::clone(&self.cache)
    }
}

/// Slow constructors widen the window in which callers race.
fn pause() {
    std::thread::sleep(Duration::from_millis(10));
}

fn diamond(probe: &CountingFactory) -> Vec<CapabilityDescriptor> {
    vec![
        Registration::<dyn Gateway>::implemented_by::<HttpGateway>()
            .constructor(
                [Param::capability::<dyn Index>(), Param::capability::<dyn Cache>()],
                probe.wrap("gateway", |deps| {
                    pause();
                    Ok(Arc::new(HttpGateway {
                        index: deps.get::<dyn Index>()?,
                        cache: deps.get::<dyn Cache>()?,
                    }) as Arc<dyn Gateway>)
                }),
            )
            .build(),
        Registration::<dyn Index>::implemented_by::<JournalIndex>()
            .constructor(
                [Param::capability::<dyn Journal>()],
                probe.wrap("index", |deps| {
                    pause();
                    Ok(Arc::new(JournalIndex(deps.get::<dyn Journal>()?)) as Arc<dyn Index>)
                }),
            )
            .build(),
        Registration::<dyn Cache>::implemented_by::<JournalCache>()
            .constructor(
                [Param::capability::<dyn Journal>()],
                probe.wrap("cache", |deps| {
                    pause();
                    Ok(Arc::new(JournalCache(deps.get::<dyn Journal>()?)) as Arc<dyn Cache>)
                }),
            )
            .build(),
        Registration::<dyn Journal>::implemented_by::<FileJournal>()
            .constructor(
                [Param::capability::<dyn Clock>()],
                probe.wrap("journal", |deps| {
                    pause();
                    let clock = deps.get::<dyn Clock>()?;
                    Ok(Arc::new(FileJournal(clock.now())) as Arc<dyn Journal>)
                }),
            )
            .build(),
    ]
}

fn container(probe: &CountingFactory) -> ServiceContainer {
    let container = ServiceContainer::with_clock(Arc::new(ManualClock::epoch()));
    container.register(diamond(probe));
    container
}

#[test]
fn test_diamond_constructed_once_under_contention() {
    init_test_logging();
    const THREADS: usize = 64;

    let probe = CountingFactory::new();
    let container = container(&probe);
    let barrier = Barrier::new(THREADS);

    let gateways: Vec<Arc<dyn Gateway>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let container = &container;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    // Half the callers enter through a leaf to overlap claims.
                    if i % 2 == 0 {
                        container.get::<dyn Cache>().unwrap();
                    }
                    container.get::<dyn Gateway>().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for label in ["gateway", "index", "cache", "journal"] {
        assert_eq!(probe.calls(label), 1, "{label} constructed more than once");
    }
    assert!(gateways.iter().all(|g| Arc::ptr_eq(g, &gateways[0])));

    let gateway = &gateways[0];
    assert!(Arc::ptr_eq(&gateway.index().journal(), &gateway.cache().journal()));
    assert_eq!(
        gateway.index().journal().opened_at(),
        ManualClock::epoch().now()
    );
}

#[test]
fn test_dependencies_finish_before_dependents() {
    let probe = CountingFactory::new();
    let container = container(&probe);

    container.get::<dyn Gateway>().unwrap();

    assert!(probe.ran_before("journal", "index"));
    assert!(probe.ran_before("journal", "cache"));
    assert!(probe.ran_before("index", "gateway"));
    assert!(probe.ran_before("cache", "gateway"));
    assert_eq!(probe.order().last(), Some(&"gateway"));
}

#[test]
fn test_dependency_failure_reaches_all_dependents() {
    const THREADS: usize = 16;

    let probe = CountingFactory::new();
    let container = ServiceContainer::new();
    let mut descriptors = diamond(&probe);
    descriptors.pop();
    descriptors.push(
        Registration::<dyn Journal>::implemented_by::<FileJournal>()
            .constructor(
                [],
                probe.wrap("journal", |_| -> Result<Arc<dyn Journal>, BoxError> {
                    pause();
                    Err("journal volume is read-only".into())
                }),
            )
            .build(),
    );
    container.register(descriptors);

    let barrier = Barrier::new(THREADS);
    std::thread::scope(|scope| {
        for i in 0..THREADS {
            let container = &container;
            let barrier = &barrier;
            scope.spawn(move || {
                barrier.wait();
                let err = if i % 2 == 0 {
                    container.get::<dyn Gateway>().err().unwrap()
                } else {
                    container.get::<dyn Index>().err().unwrap()
                };
                assert!(matches!(err, ServiceError::ConstructionFailed { .. }));
                assert!(err.to_string().contains("read-only"));
            });
        }
    });

    assert_eq!(probe.calls("journal"), 1);
    assert_eq!(probe.calls("index"), 0);
    assert_eq!(probe.calls("gateway"), 0);
}

/// Marker capability, one type per slot.
struct Slot<const N: usize>;

fn slot<const N: usize>() -> CapabilityDescriptor {
    Registration::<Slot<N>>::implemented_by::<Slot<N>>()
        .constructor([], |_| Ok(Arc::new(Slot::<N>)))
        .build()
}

#[test]
fn test_registration_races_resolution() {
    let probe = CountingFactory::new();
    let container = container(&probe);
    let barrier = Barrier::new(6);

    std::thread::scope(|scope| {
        let registrations: [fn() -> CapabilityDescriptor; 4] =
            [slot::<0>, slot::<1>, slot::<2>, slot::<3>];
        for register in registrations {
            let container = &container;
            let barrier = &barrier;
            scope.spawn(move || {
                barrier.wait();
                container.register([register()]);
            });
        }
        for _ in 0..2 {
            let container = &container;
            let barrier = &barrier;
            scope.spawn(move || {
                barrier.wait();
                container.get::<dyn Gateway>().unwrap();
            });
        }
    });

    assert_eq!(container.registered_capabilities().len(), 8);
    assert!(container.get::<Slot<0>>().is_ok());
    assert!(container.get::<Slot<3>>().is_ok());
    assert_eq!(probe.calls("gateway"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_blocking_tasks_share_one_instance() {
    let probe = CountingFactory::new();
    let container = Arc::new(container(&probe));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let container = Arc::clone(&container);
            tokio::task::spawn_blocking(move || container.get::<dyn Gateway>())
        })
        .collect();

    let mut gateways = Vec::new();
    for task in tasks {
        gateways.push(task.await.unwrap().unwrap());
    }

    assert!(gateways.iter().all(|g| Arc::ptr_eq(g, &gateways[0])));
    assert_eq!(probe.total(), 4);
}
