use sigma_core::Timestamp;

/// Port for time abstraction
///
/// This allows the venue to use different time sources:
/// - Real system time for production
/// - Manually driven time for deterministic tests and replays
pub trait Clock: Send + Sync {
    /// Get the current time according to this clock
    fn now(&self) -> Timestamp;

    /// Get the clock's name/identifier for debugging
    fn name(&self) -> &str {
        "Clock"
    }
}
