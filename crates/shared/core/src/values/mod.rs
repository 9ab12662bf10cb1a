use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unit price of an instrument, in venue currency
pub type Price = Decimal;

/// Currency amount (balances, trade values)
pub type Amount = Decimal;

/// Whole units of an instrument
pub type Quantity = u64;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Unique identifier for a trade
pub type TradeId = Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Unique code of a tradable instrument (e.g. `GOOG`)
    InstrumentCode
);

string_id!(
    /// Unique identifier of a registered participant.
    ///
    /// Ordered so that account locks can be taken in a global order.
    ParticipantId
);

string_id!(
    /// Identifier of an order, unique among the live orders of its book
    OrderId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_display_and_compare() {
        let a = ParticipantId::from("alice");
        let b = ParticipantId::new(String::from("bob"));

        assert!(a < b);
        assert_eq!(a.to_string(), "alice");
        assert_eq!(InstrumentCode::from("GOOG").as_str(), "GOOG");
        assert!(OrderId::from("").is_empty());
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&InstrumentCode::from("GOOG")).unwrap();
        assert_eq!(json, "\"GOOG\"");

        let id: OrderId = serde_json::from_str("\"A\"").unwrap();
        assert_eq!(id, OrderId::from("A"));
    }
}
