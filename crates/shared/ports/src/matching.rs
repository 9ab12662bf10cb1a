use sigma_core::Order;

/// Port for the rule deciding whether a resting order answers an incoming one
///
/// The rule is a pure predicate: discovering a match never mutates the book.
pub trait MatchingRule: Send + Sync {
    /// Check if `resting` is an acceptable counter-order for `incoming`
    fn is_match(&self, incoming: &Order, resting: &Order) -> bool;

    /// Get the name of the rule
    fn name(&self) -> &str;
}
