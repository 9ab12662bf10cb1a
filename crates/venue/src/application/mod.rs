pub mod settlement;
pub mod venue;

pub use settlement::{SettlementEngine, SettlementJournal, SettlementParties};
pub use venue::Venue;
