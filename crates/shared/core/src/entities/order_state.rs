use serde::{Deserialize, Serialize};

/// Lifecycle of an order inside a book.
///
/// ```text
/// Submitted ──► Resting ──► Matched
///     │            │
///     │            └──────► Withdrawn
///     ├───────────────────► Matched
///     └───────────────────► Withdrawn
/// ```
///
/// There is no partially filled state: matching is exact-quantity only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderState {
    /// Received by the venue, not yet resting or matched
    Submitted,
    /// Live in the book, waiting for an exact counter-order
    Resting,
    /// Settled against a counter-order
    Matched,
    /// Withdrawn by its owner
    Withdrawn,
}

impl OrderState {
    /// Returns true if the order can no longer change state
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Matched | OrderState::Withdrawn)
    }

    /// Returns true if the order is live in a book
    pub fn is_live(&self) -> bool {
        matches!(self, OrderState::Resting)
    }

    pub fn can_transition_to(&self, next: OrderState) -> bool {
        matches!(
            (self, next),
            (
                OrderState::Submitted,
                OrderState::Resting | OrderState::Matched | OrderState::Withdrawn
            ) | (OrderState::Resting, OrderState::Matched | OrderState::Withdrawn)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert!(OrderState::Submitted.can_transition_to(OrderState::Resting));
        assert!(OrderState::Submitted.can_transition_to(OrderState::Matched));
        assert!(OrderState::Resting.can_transition_to(OrderState::Withdrawn));
        assert!(!OrderState::Resting.can_transition_to(OrderState::Submitted));
        assert!(!OrderState::Matched.can_transition_to(OrderState::Withdrawn));
        assert!(!OrderState::Withdrawn.can_transition_to(OrderState::Resting));
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderState::Matched.is_terminal());
        assert!(OrderState::Withdrawn.is_terminal());
        assert!(!OrderState::Resting.is_terminal());
        assert!(OrderState::Resting.is_live());
    }
}
