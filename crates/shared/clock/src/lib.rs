//! Sigma Clock Infrastructure
//!
//! Time sources implementing the `Clock` port:
//!
//! - `SystemClock`: wall-clock time
//! - `ManualClock`: time that only moves when told to, for tests and replays
//!
//! ## Usage
//!
//! ```ignore
//! use sigma_clock::{Clock, ManualClock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::default();
//! let t0 = clock.now();
//! clock.advance(Duration::seconds(5));
//! assert_eq!(clock.now() - t0, Duration::seconds(5));
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use sigma_ports::Clock;
