//! Sigma Core Domain
//!
//! Pure domain types for the Sigma trading venue.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod instruments;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    AccountError, Holding, Order, OrderState, OrderValidationError, ParticipantAccount, Side,
    Trade,
};
pub use instruments::Instrument;
pub use values::{
    Amount, InstrumentCode, OrderId, ParticipantId, Price, Quantity, Timestamp, TradeId,
};
