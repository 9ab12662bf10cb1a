use serde::{Deserialize, Serialize};

use crate::values::{InstrumentCode, Price};

/// Static reference data for a tradable instrument.
///
/// Instruments carry no behavior; the venue only reads them. Each
/// registered instrument gets exactly one order book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Unique key (e.g. `GOOG`)
    pub code: InstrumentCode,
    /// Human readable name
    pub description: String,
    /// Indicative price at listing time
    pub reference_price: Price,
}

impl Instrument {
    pub fn new(
        code: impl Into<InstrumentCode>,
        description: impl Into<String>,
        reference_price: Price,
    ) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            reference_price,
        }
    }

    pub fn code(&self) -> &InstrumentCode {
        &self.code
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_instrument_creation() {
        let goog = Instrument::new("GOOG", "Google Plc.", dec!(100.00));

        assert_eq!(goog.code().as_str(), "GOOG");
        assert_eq!(goog.reference_price, dec!(100));
        assert_eq!(goog.to_string(), "GOOG (Google Plc.)");
    }
}
