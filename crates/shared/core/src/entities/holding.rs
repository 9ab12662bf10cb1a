use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::values::{Amount, Price, Quantity};

/// A participant's position in one instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    /// Units held (never negative)
    pub quantity: Quantity,

    /// Quantity-weighted average acquisition price
    pub average_cost: Price,
}

impl Holding {
    pub fn new(quantity: Quantity, average_cost: Price) -> Self {
        Self {
            quantity,
            average_cost,
        }
    }

    /// The holding after adding units acquired at `unit_cost`, with the
    /// average cost re-weighted. `None` if the units or the cost basis
    /// would overflow.
    pub fn checked_increase(&self, quantity: Quantity, unit_cost: Price) -> Option<Holding> {
        let total = self.quantity.checked_add(quantity)?;
        if total == 0 {
            return Some(*self);
        }

        let weighted = self
            .cost_basis()?
            .checked_add(unit_cost.checked_mul(Decimal::from(quantity))?)?;
        Some(Holding::new(total, weighted.checked_div(Decimal::from(total))?))
    }

    /// Total acquisition cost of the units held
    pub fn cost_basis(&self) -> Option<Amount> {
        self.average_cost.checked_mul(Decimal::from(self.quantity))
    }

    /// Value of the units held at `price`
    pub fn market_value(&self, price: Price) -> Option<Amount> {
        price.checked_mul(Decimal::from(self.quantity))
    }

    pub fn is_empty(&self) -> bool {
        self.quantity == 0
    }
}
