use serde::Serialize;
use sigma_core::{
    Amount, InstrumentCode, OrderId, OrderValidationError, ParticipantId, Quantity,
};
use sigma_ports::BookError;
use thiserror::Error;

/// Which registry rejected a duplicate key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegistryKind {
    Instrument,
    Participant,
}

impl std::fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryKind::Instrument => f.write_str("instrument"),
            RegistryKind::Participant => f.write_str("participant"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VenueError {
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(InstrumentCode),

    #[error("Unknown participant: {0}")]
    UnknownParticipant(ParticipantId),

    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: RegistryKind, id: String },

    #[error("Duplicate order id: {0}")]
    DuplicateOrder(OrderId),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error(
        "Participant {participant} has insufficient funds: required {required}, available {available}"
    )]
    InsufficientFunds {
        participant: ParticipantId,
        required: Amount,
        available: Amount,
    },

    #[error(
        "Participant {participant} holds {held} {instrument}, cannot deliver {required}"
    )]
    InsufficientHoldings {
        participant: ParticipantId,
        instrument: InstrumentCode,
        required: Quantity,
        held: Quantity,
    },

    #[error("Invalid order: {0}")]
    InvalidOrder(#[from] OrderValidationError),

    #[error("Invalid amount: {0}")]
    InvalidAmount(Amount),

    #[error("Settlement would overflow the account of {participant}: {reason}")]
    AccountOverflow {
        participant: ParticipantId,
        reason: String,
    },

    #[error("Settlement failed and was rolled back: {0}")]
    SettlementFailure(String),

    #[error("Venue service is not running")]
    ServiceUnavailable,
}

/// Fieldless discriminant of `VenueError`, for branching without matching fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    UnknownInstrument,
    UnknownParticipant,
    DuplicateId,
    DuplicateOrder,
    OrderNotFound,
    InsufficientFunds,
    InsufficientHoldings,
    InvalidOrder,
    InvalidAmount,
    AccountOverflow,
    SettlementFailure,
    ServiceUnavailable,
}

impl VenueError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VenueError::UnknownInstrument(_) => ErrorKind::UnknownInstrument,
            VenueError::UnknownParticipant(_) => ErrorKind::UnknownParticipant,
            VenueError::DuplicateId { .. } => ErrorKind::DuplicateId,
            VenueError::DuplicateOrder(_) => ErrorKind::DuplicateOrder,
            VenueError::OrderNotFound(_) => ErrorKind::OrderNotFound,
            VenueError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            VenueError::InsufficientHoldings { .. } => ErrorKind::InsufficientHoldings,
            VenueError::InvalidOrder(_) => ErrorKind::InvalidOrder,
            VenueError::InvalidAmount(_) => ErrorKind::InvalidAmount,
            VenueError::AccountOverflow { .. } => ErrorKind::AccountOverflow,
            VenueError::SettlementFailure(_) => ErrorKind::SettlementFailure,
            VenueError::ServiceUnavailable => ErrorKind::ServiceUnavailable,
        }
    }

    /// System faults indicate a broken invariant; everything else is a
    /// business-rule rejection that left state unchanged.
    pub fn is_system_fault(&self) -> bool {
        matches!(
            self,
            VenueError::SettlementFailure(_) | VenueError::ServiceUnavailable
        )
    }
}

pub type Result<T> = std::result::Result<T, VenueError>;

impl From<BookError> for VenueError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::DuplicateOrder(id) => VenueError::DuplicateOrder(id),
            BookError::OrderNotFound(id) => VenueError::OrderNotFound(id),
        }
    }
}
