//! Prelude module - commonly used types for convenient import.
//!
//! Use `use keystone_services::prelude::*;` to import all essential types.

// Errors
pub use crate::{BoxError, ServiceError, ServiceResult};

// Registration
pub use crate::{CapabilityDescriptor, Param, Registration, ServiceModule, ServiceTable};

// Resolution
pub use crate::{Clock, Dependencies, ServiceContainer, SystemClock};
