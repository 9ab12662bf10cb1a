use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::values::{Amount, InstrumentCode, OrderId, ParticipantId, Price, Quantity, TradeId};

/// Immutable record of one settled match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    /// The instrument that was traded
    pub instrument_code: InstrumentCode,
    pub buyer_id: ParticipantId,
    pub seller_id: ParticipantId,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub unit_price: Price,
    pub quantity: Quantity,
    pub timestamp: DateTime<Utc>,
}

impl Trade {
    /// Create a new trade with explicit timestamp
    #[allow(clippy::too_many_arguments)]
    pub fn new_with_time(
        instrument_code: impl Into<InstrumentCode>,
        buyer_id: ParticipantId,
        seller_id: ParticipantId,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        unit_price: Price,
        quantity: Quantity,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument_code: instrument_code.into(),
            buyer_id,
            seller_id,
            buy_order_id,
            sell_order_id,
            unit_price,
            quantity,
            timestamp,
        }
    }

    /// Amount moved from buyer to seller: unit price times quantity.
    ///
    /// `None` only when the product does not fit a `Decimal`, which a
    /// validated order pair never produces.
    pub fn total_value(&self) -> Option<Amount> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }

    /// Returns true if the participant was on either side of the trade
    pub fn involves(&self, participant: &ParticipantId) -> bool {
        &self.buyer_id == participant || &self.seller_id == participant
    }
}
