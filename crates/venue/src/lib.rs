//! Sigma trading venue
//!
//! Exact-match order books per instrument, with all-or-nothing settlement
//! of funds and holdings between participant accounts.

// Application layer
pub mod application;

// Infrastructure layer
pub mod infrastructure;

// Cross-cutting concerns
pub mod error;
pub mod model;

// Re-export main types for convenience
pub use application::{SettlementEngine, SettlementParties, Venue};
pub use error::{ErrorKind, RegistryKind, Result, VenueError};
pub use infrastructure::{
    ConfigError, SequentialAllocator, UuidAllocator, VenueConfig, VenueHandle, VenueService,
};
pub use model::{OrderResponse, Outcome, SubmitOutcome, VenueSnapshot};
