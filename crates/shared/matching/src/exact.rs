use sigma_core::Order;
use sigma_ports::MatchingRule;

/// Exact price-and-quantity matching
///
/// A resting order answers an incoming one only when it sits on the
/// opposite side with the identical unit price and identical quantity.
/// No partial fills, no price improvement.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatchRule;

impl ExactMatchRule {
    pub fn new() -> Self {
        Self
    }
}

impl MatchingRule for ExactMatchRule {
    fn name(&self) -> &str {
        "Exact Price-Quantity"
    }

    fn is_match(&self, incoming: &Order, resting: &Order) -> bool {
        incoming.side == resting.side.opposite()
            && incoming.unit_price == resting.unit_price
            && incoming.quantity == resting.quantity
    }
}
