// Re-export domain types from sigma-core so callers need one import path
pub use sigma_core::{
    Amount, Holding, Instrument, InstrumentCode, Order, OrderId, OrderState, ParticipantAccount,
    ParticipantId, Price, Quantity, Side, Timestamp, Trade, TradeId,
};
pub use sigma_matching::BookSnapshot;

use serde::Serialize;

use crate::error::VenueError;

/// What happened to a successfully submitted order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SubmitOutcome {
    /// No exact counter-order; the order now rests on the book
    Resting(OrderId),
    /// Matched and settled immediately
    Settled(Trade),
}

impl SubmitOutcome {
    pub fn trade(&self) -> Option<&Trade> {
        match self {
            SubmitOutcome::Resting(_) => None,
            SubmitOutcome::Settled(trade) => Some(trade),
        }
    }

    pub fn is_resting(&self) -> bool {
        matches!(self, SubmitOutcome::Resting(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Ok,
    Error,
}

/// Uniform result shape for adapters.
///
/// `ok` without a trade means the order is resting, `ok` with a trade means
/// it settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderResponse {
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade: Option<Trade>,
    pub errors: Vec<String>,
}

impl OrderResponse {
    pub fn is_ok(&self) -> bool {
        self.outcome == Outcome::Ok
    }
}

impl From<Result<SubmitOutcome, VenueError>> for OrderResponse {
    fn from(result: Result<SubmitOutcome, VenueError>) -> Self {
        match result {
            Ok(SubmitOutcome::Resting(_)) => Self {
                outcome: Outcome::Ok,
                trade: None,
                errors: Vec::new(),
            },
            Ok(SubmitOutcome::Settled(trade)) => Self {
                outcome: Outcome::Ok,
                trade: Some(trade),
                errors: Vec::new(),
            },
            Err(e) => Self {
                outcome: Outcome::Error,
                trade: None,
                errors: vec![e.to_string()],
            },
        }
    }
}

/// Point-in-time view of the whole venue, ordered by key
#[derive(Debug, Clone, Serialize)]
pub struct VenueSnapshot {
    pub name: String,
    pub instruments: Vec<Instrument>,
    pub accounts: Vec<ParticipantAccount>,
    pub books: Vec<BookSnapshot>,
    pub trades: Vec<Trade>,
}
