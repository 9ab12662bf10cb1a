//! Sigma Matching
//!
//! Per-instrument order book and the matching rule it applies.

mod book;
mod exact;

pub use book::{
    BookSnapshot, DEFAULT_TERMINAL_RETENTION, OrderBook, PriorStates, RemovalReason,
};
pub use exact::ExactMatchRule;

// Re-export the port for convenience
pub use sigma_ports::{BookError, BookResult, MatchingRule};
