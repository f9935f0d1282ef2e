//! Element and attribute names of the configuration document.

/// Block whose children are injected into the roles listed in [`WITH`].
pub const SHARED: &str = "Shared";
/// Attribute of [`SHARED`]: `*` or a comma-separated list of role tags.
pub const WITH: &str = "With";
/// Section holding configuration common to every node.
pub const GLOBAL: &str = "Global";
/// Per-node section, keyed by its [`NAME`] attribute.
pub const NODE: &str = "Node";
/// Node name attribute, on [`NODE`] sections and on generated per-node trees.
pub const NAME: &str = "Name";
/// Wrapper for one node's runtime settings inside the reserved runtime element.
pub const OVERRIDE: &str = "Override";
/// Attribute of [`OVERRIDE`] naming the contributing node.
pub const OVERRIDE_NODE: &str = "Node";
/// Network endpoint declaration.
pub const ENDPOINT: &str = "Endpoint";
/// Endpoint IP address attribute.
pub const ADDRESS: &str = "Address";
/// Endpoint port attribute.
pub const PORT: &str = "Port";
/// Endpoint externally reachable address attribute.
pub const ACCESS_ADDR: &str = "AccessAddr";
/// Logging settings element.
pub const LOGGING: &str = "Logging";

/// `With` value that selects every role.
pub const WILDCARD: &str = "*";
/// Default name of the element whose per-node overrides accumulate.
pub const ACTOR_RUNTIME: &str = "ActorRuntime";
