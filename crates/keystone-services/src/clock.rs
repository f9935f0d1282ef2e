//! Process clock capability.

use chrono::{DateTime, Utc};

/// Wall-clock time source.
///
/// The container resolves `dyn Clock` itself instead of looking it up in the
/// capability map, so any constructor may depend on it without a registration.
pub trait Clock: Send + Sync {
    /// Current time in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
