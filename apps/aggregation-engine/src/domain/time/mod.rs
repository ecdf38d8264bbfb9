//! Time Providers
//!
//! The consolidation engine never reads the wall clock directly; it asks a
//! [`TimeProvider`] injected at construction. Production code uses
//! [`RealTimeProvider`]; tests drive [`ManualTimeProvider`] to flush period
//! boundaries deterministically.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

/// Supplies the current UTC time to period-based consolidators.
pub trait TimeProvider: Send + Sync {
    /// The current UTC time.
    fn current_utc(&self) -> DateTime<Utc>;
}

/// Wall-clock time provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn current_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven time provider for deterministic tests.
#[derive(Debug)]
pub struct ManualTimeProvider {
    now: RwLock<DateTime<Utc>>,
}

impl ManualTimeProvider {
    /// Create a provider frozen at the given time.
    #[must_use]
    pub const fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Jump the clock to an absolute time.
    pub fn set_time(&self, time: DateTime<Utc>) {
        *self.now.write() = time;
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write();
        *now += by;
    }
}

impl TimeProvider for ManualTimeProvider {
    fn current_utc(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}
