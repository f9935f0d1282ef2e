#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Capability registry and singleton construction for Keystone nodes.
//!
//! Services are registered against a *capability* (usually a trait object
//! type) and constructed lazily the first time anyone asks for them. The
//! container guarantees that each capability's constructor runs at most once,
//! no matter how many threads race for it, and that a service's dependencies
//! are fully constructed before the service itself.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use keystone_services::{Clock, Param, Registration, ServiceContainer};
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct ClockGreeter(Arc<dyn Clock>);
//!
//! impl Greeter for ClockGreeter {
//!     fn greet(&self) -> String {
//!         format!("hello at {}", self.0.now())
//!     }
//! }
//!
//! let container = ServiceContainer::new();
//! container.register([Registration::<dyn Greeter>::implemented_by::<ClockGreeter>()
//!     .constructor([Param::capability::<dyn Clock>()], |deps| {
//!         Ok(Arc::new(ClockGreeter(deps.get::<dyn Clock>()?)) as Arc<dyn Greeter>)
//!     })
//!     .build()]);
//!
//! let greeter = container.get::<dyn Greeter>()?;
//! assert!(greeter.greet().starts_with("hello"));
//! assert!(Arc::ptr_eq(&greeter, &container.get::<dyn Greeter>()?));
//! # Ok::<(), keystone_services::ServiceError>(())
//! ```
//!
//! # Layout
//!
//! - [`registry`]: the lock-free capability map.
//! - [`resolver`]: constructor selection.
//! - [`container`]: exactly-once construction and the runtime API.

pub mod prelude;

pub mod capability;
pub mod clock;
pub mod container;
pub mod descriptor;
pub mod error;
pub mod module;
pub mod registry;
pub mod resolver;

pub use capability::{CapabilityId, ImplementationId, Param};
pub use clock::{Clock, SystemClock};
pub use container::ServiceContainer;
pub use descriptor::{CapabilityDescriptor, Constructor, Dependencies, Implementation, Registration};
pub use error::{BoxError, ServiceError, ServiceResult};
pub use module::{ServiceModule, ServiceTable};
pub use registry::CapabilityRegistry;
