//! Keystone Telemetry - logging for Keystone nodes.
//!
//! This crate provides:
//! - [`LogConfig`], covering level, directives, format and output target
//! - [`setup_logging`], which installs a global `tracing` subscriber
//! - with the `config` feature, `LogConfig::from_node` for reading a
//!   `Logging` element out of a node's configuration tree
//!
//! # Example
//!
//! ```rust,no_run
//! use keystone_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), keystone_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("keystone_services=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("logging ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;
#[cfg(feature = "config")]
mod node;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    DEFAULT_FILE_PREFIX, FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget,
    setup_default_logging, setup_logging,
};
