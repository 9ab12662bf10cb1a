use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use sigma_core::Timestamp;
use sigma_ports::Clock;

/// Clock that only moves when told to
///
/// Every call to `now()` returns the same instant until `set` or `advance`
/// is called, which makes trade timestamps reproducible in tests.
pub struct ManualClock {
    current: RwLock<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: RwLock::new(start),
        }
    }

    /// Set the current time
    pub fn set(&self, time: Timestamp) {
        *self.current.write() = time;
    }

    /// Move time forward (or backward for a negative duration)
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.write();
        *current += duration;
    }
}

impl Default for ManualClock {
    /// Starts at the Unix epoch
    fn default() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.read()
    }

    fn name(&self) -> &str {
        "ManualClock"
    }
}
