//! Prelude module - commonly used test utilities.
//!
//! Use `use keystone_test::prelude::*;` in test modules.

// Mocks
pub use crate::{CountingFactory, FixedAddressResolver, ManualClock};

// Fixtures
pub use crate::{SAMPLE_DOCUMENT_TOML, sample_document, sample_rules};

// Harness
pub use crate::{init_test_logging, setup_test_logging, test_dir, test_document_file};
