use sigma_core::OrderId;
use thiserror::Error;

/// Domain-level errors for order book operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("Order already live in book: {0}")]
    DuplicateOrder(OrderId),

    #[error("Order not found in book: {0}")]
    OrderNotFound(OrderId),
}

pub type BookResult<T> = std::result::Result<T, BookError>;
