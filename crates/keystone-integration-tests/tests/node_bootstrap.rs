//! Bootstrapping nodes from a document on disk and resolving their services.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use keystone_bootstrap::{BootstrapError, NodeBootstrap, NodeConfig};
use keystone_config::{ConfigDocument, RoleTag, names};
use keystone_services::{
    BoxError, Clock, Dependencies, Param, Registration, ServiceError, ServiceTable,
};
use keystone_telemetry::{LogFormat, LogTarget};
use keystone_test::{
    CountingFactory, FixedAddressResolver, ManualClock, SAMPLE_DOCUMENT_TOML, init_test_logging,
    sample_rules, test_document_file,
};

trait Listener: Send + Sync {
    fn local_addr(&self) -> SocketAddr;
}

trait SessionStore: Send + Sync {
    fn created_at(&self) -> DateTime<Utc>;
}

trait Frontend: Send + Sync {
    fn listener(&self) -> Arc<dyn Listener>;
    fn sessions(&self) -> Arc<dyn SessionStore>;
}

struct TcpListener(SocketAddr);
impl Listener for TcpListener {
    fn local_addr(&self) -> SocketAddr {
        self.0
    }
}

struct MemorySessions(DateTime<Utc>);
impl SessionStore for MemorySessions {
    fn created_at(&self) -> DateTime<Utc> {
        self.0
    }
}

struct ClusterFrontend {
    listener: Arc<dyn Listener>,
    sessions: Arc<dyn SessionStore>,
}
impl Frontend for ClusterFrontend {
    fn listener(&self) -> Arc<dyn Listener> {
        Arc::clone(&self.listener)
    }
    fn sessions(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.sessions)
    }
}

fn server() -> RoleTag {
    RoleTag::new("Cluster.Server")
}

fn listener(deps: &Dependencies) -> Result<Arc<dyn Listener>, BoxError> {
    let config = deps.get::<NodeConfig>()?;
    Ok(Arc::new(TcpListener(config.endpoint(&server())?)))
}

fn services(probe: &CountingFactory) -> ServiceTable {
    ServiceTable::new("frontend")
        .with(
            Registration::<dyn Frontend>::implemented_by::<ClusterFrontend>()
                .constructor(
                    [
                        Param::capability::<dyn Listener>(),
                        Param::capability::<dyn SessionStore>(),
                    ],
                    probe.wrap("frontend", |deps| {
                        Ok(Arc::new(ClusterFrontend {
                            listener: deps.get::<dyn Listener>()?,
                            sessions: deps.get::<dyn SessionStore>()?,
                        }) as Arc<dyn Frontend>)
                    }),
                )
                .build(),
        )
        .with(
            Registration::<dyn Listener>::implemented_by::<TcpListener>()
                .constructor([Param::capability::<NodeConfig>()], probe.wrap("listener", listener))
                .build(),
        )
        .with(
            Registration::<dyn SessionStore>::implemented_by::<MemorySessions>()
                .constructor(
                    [Param::capability::<dyn Clock>()],
                    probe.wrap("sessions", |deps| {
                        let clock = deps.get::<dyn Clock>()?;
                        Ok(Arc::new(MemorySessions(clock.now())) as Arc<dyn SessionStore>)
                    }),
                )
                .build(),
        )
}

fn bootstrap(node: &str, probe: &CountingFactory, clock: Arc<ManualClock>) -> NodeBootstrap {
    init_test_logging();
    let file = test_document_file(SAMPLE_DOCUMENT_TOML);
    NodeBootstrap::builder()
        .config_document(ConfigDocument::load_file(file.path()).unwrap())
        .rules(sample_rules())
        .node(node)
        .address_resolver(Arc::new(FixedAddressResolver::single([10, 0, 0, 2])))
        .clock(clock)
        .module(services(probe))
        .build()
        .unwrap()
}

#[test]
fn test_each_node_listens_on_its_own_endpoint() {
    let clock = Arc::new(ManualClock::epoch());

    let first = bootstrap("node-1", &CountingFactory::new(), Arc::clone(&clock));
    let second = bootstrap("node-2", &CountingFactory::new(), clock);

    let addr = |node: &NodeBootstrap| node.get::<dyn Frontend>().unwrap().listener().local_addr();
    assert_eq!(addr(&first), "10.0.0.1:11111".parse().unwrap());
    assert_eq!(addr(&second), "10.0.0.2:11111".parse().unwrap());
}

#[test]
fn test_services_constructed_lazily_in_dependency_order() {
    let probe = CountingFactory::new();
    let node = bootstrap("node-1", &probe, Arc::new(ManualClock::epoch()));

    assert_eq!(probe.total(), 0);
    assert!(!node.container().is_constructed::<dyn Frontend>());

    let frontend = node.get::<dyn Frontend>().unwrap();
    assert!(Arc::ptr_eq(&frontend, &node.get::<dyn Frontend>().unwrap()));

    assert_eq!(probe.total(), 3);
    assert!(probe.ran_before("listener", "frontend"));
    assert!(probe.ran_before("sessions", "frontend"));
    assert!(node.container().is_constructed::<dyn Listener>());
}

#[test]
fn test_services_observe_the_injected_clock() {
    let clock = Arc::new(ManualClock::epoch());
    let node = bootstrap("node-1", &CountingFactory::new(), Arc::clone(&clock));

    clock.advance(Duration::seconds(90));
    let sessions = node.get::<dyn SessionStore>().unwrap();
    clock.advance(Duration::seconds(90));

    assert_eq!(
        sessions.created_at(),
        ManualClock::epoch()
            .now()
            .checked_add_signed(Duration::seconds(90))
            .unwrap()
    );
    assert!(Arc::ptr_eq(
        &node.get::<dyn SessionStore>().unwrap(),
        &sessions
    ));
}

#[test]
fn test_sealed_node_rejects_config_override() {
    let node = bootstrap("node-2", &CountingFactory::new(), Arc::new(ManualClock::epoch()));
    let other = NodeConfig::new(node.config().tree().clone());

    let err = node.container().set_capability(Arc::new(other)).unwrap_err();
    assert!(matches!(err, ServiceError::BootstrapClosed { .. }));
}

#[test]
fn test_node_config_exposes_merged_tree() {
    let node = bootstrap("node-2", &CountingFactory::new(), Arc::new(ManualClock::epoch()));
    let config = node.config();

    assert_eq!(config.node_name(), Some("node-2"));
    assert_eq!(config.access_address(&server()).unwrap(), None);

    let runtime = config.role(&server()).unwrap().child(names::ACTOR_RUNTIME).unwrap();
    assert_eq!(runtime.children_named(names::OVERRIDE).count(), 2);

    let logging = config.logging(&server()).unwrap().unwrap();
    assert_eq!(logging.format, LogFormat::Compact);
    assert_eq!(logging.target, LogTarget::Stderr);
}

#[test]
fn test_unparseable_endpoint_fails_listener() {
    let document = r#"
name = "Cluster"

[[children]]
name = "Global"

[[children.children]]
name = "Cluster.Server"

[[children.children.children]]
name = "Endpoint"
attributes = { Address = "10.0.0.1", Port = "eleven" }
"#;
    let file = test_document_file(document);
    let node = NodeBootstrap::builder()
        .config_document(ConfigDocument::load_file(file.path()).unwrap())
        .rules(sample_rules())
        .node("node-1")
        .module(
            ServiceTable::new("listener").with(
                Registration::<dyn Listener>::implemented_by::<TcpListener>()
                    .constructor([Param::capability::<NodeConfig>()], listener)
                    .build(),
            ),
        )
        .build()
        .unwrap();

    let err = node.get::<dyn Listener>().err().unwrap();
    assert!(matches!(err, ServiceError::ConstructionFailed { .. }));
    assert!(err.to_string().contains("Port"));
    assert!(node.container().is_constructed::<dyn Listener>());
}

#[test]
fn test_missing_document_is_reported() {
    let err = NodeBootstrap::builder().node("node-1").build().err().unwrap();
    assert!(matches!(err, BootstrapError::MissingDocument));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_node_shared_across_tasks() {
    let probe = CountingFactory::new();
    let node = Arc::new(bootstrap("node-1", &probe, Arc::new(ManualClock::epoch())));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let node = Arc::clone(&node);
            tokio::task::spawn_blocking(move || node.get::<dyn Frontend>().map(|f| f.listener()))
        })
        .collect();

    let mut listeners = Vec::new();
    for task in tasks {
        listeners.push(task.await.unwrap().unwrap());
    }

    assert!(listeners.iter().all(|l| Arc::ptr_eq(l, &listeners[0])));
    assert_eq!(probe.calls("listener"), 1);
    assert_eq!(probe.calls("frontend"), 1);
}
