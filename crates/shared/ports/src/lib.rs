//! Sigma Ports
//!
//! Port definitions (traits) for the Sigma trading venue.
//! These define the boundaries between domain logic and infrastructure.

mod clock;
mod error;
mod id_allocator;
mod matching;

pub use clock::Clock;
pub use error::{BookError, BookResult};
pub use id_allocator::IdAllocator;
pub use matching::MatchingRule;
