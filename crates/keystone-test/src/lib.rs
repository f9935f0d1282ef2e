//! Keystone Test - shared test utilities.
//!
//! Mock collaborators, sample documents and harness helpers used across the
//! Keystone crates as a dev-dependency.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! keystone-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use keystone_test::{FixedAddressResolver, sample_document, sample_rules};
//! use keystone_config::{autofill_endpoints, merge};
//!
//! #[test]
//! fn test_node_two_gets_an_address() {
//!     let rules = sample_rules();
//!     let merged = merge::merge_global_roles(&sample_document(), &rules);
//!     let config = merge::generate_per_node_config(&merged, "node-2", &rules);
//!     let config = autofill_endpoints(&config, &FixedAddressResolver::single([10, 0, 0, 2]));
//!     // ...
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
