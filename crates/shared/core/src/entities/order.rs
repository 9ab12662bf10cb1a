use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Side;
use crate::values::{Amount, OrderId, ParticipantId, Price, Quantity, Timestamp};

/// Reasons an order is refused before it reaches a book
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderValidationError {
    #[error("Order id must not be empty")]
    EmptyId,

    #[error("Unit price must be positive, got {0}")]
    NonPositivePrice(Price),

    #[error("Quantity must be positive")]
    ZeroQuantity,

    #[error("Order value {price} x {quantity} exceeds the representable amount")]
    ValueOverflow { price: Price, quantity: Quantity },
}

/// A standing intent to buy or sell a fixed quantity at a fixed unit price.
///
/// Orders are immutable once created: the book only ever adds or removes
/// them, there are no partial fills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Owner of the order
    pub participant_id: ParticipantId,
    pub side: Side,
    pub unit_price: Price,
    pub quantity: Quantity,
    pub created_at: Timestamp,
}

impl Order {
    /// Create a new order with explicit timestamp
    pub fn new_with_time(
        id: impl Into<OrderId>,
        participant_id: impl Into<ParticipantId>,
        side: Side,
        unit_price: Price,
        quantity: Quantity,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            participant_id: participant_id.into(),
            side,
            unit_price,
            quantity,
            created_at,
        }
    }

    /// Create a buy order stamped with the current system time
    pub fn buy(
        id: impl Into<OrderId>,
        participant_id: impl Into<ParticipantId>,
        unit_price: Price,
        quantity: Quantity,
    ) -> Self {
        Self::new_with_time(id, participant_id, Side::Buy, unit_price, quantity, Utc::now())
    }

    /// Create a sell order stamped with the current system time
    pub fn sell(
        id: impl Into<OrderId>,
        participant_id: impl Into<ParticipantId>,
        unit_price: Price,
        quantity: Quantity,
    ) -> Self {
        Self::new_with_time(id, participant_id, Side::Sell, unit_price, quantity, Utc::now())
    }

    pub fn validate(&self) -> Result<(), OrderValidationError> {
        if self.id.is_empty() {
            return Err(OrderValidationError::EmptyId);
        }
        if self.unit_price <= Decimal::ZERO {
            return Err(OrderValidationError::NonPositivePrice(self.unit_price));
        }
        if self.quantity == 0 {
            return Err(OrderValidationError::ZeroQuantity);
        }
        if self.notional().is_none() {
            return Err(OrderValidationError::ValueOverflow {
                price: self.unit_price,
                quantity: self.quantity,
            });
        }
        Ok(())
    }

    /// Price times quantity, `None` when the product does not fit a `Decimal`
    pub fn notional(&self) -> Option<Amount> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }

    pub fn is_buy(&self) -> bool {
        self.side == Side::Buy
    }
}
