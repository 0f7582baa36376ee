//! Injectable time source for TTL stores.

use chrono::{DateTime, Utc};

/// Supplies the current time. Injected so tests can drive expiry
/// deterministically instead of sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
