//! Configuration loading for the venue
//!
//! A JSON document lists the instruments to list, the participants to open
//! accounts for (with opening balances and holdings) and seed orders that
//! are replayed through normal order entry once everything is registered.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::application::Venue;
use crate::error::VenueError;
use crate::model::{Amount, Instrument, InstrumentCode, Order, ParticipantAccount, Price, Quantity, Side};

/// Root configuration for a venue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    /// Venue name/identifier
    #[serde(default = "default_venue_name")]
    pub name: String,

    /// Instruments to list, one order book each
    #[serde(default)]
    pub instruments: Vec<InstrumentConfig>,

    /// Participant accounts to open
    #[serde(default)]
    pub participants: Vec<ParticipantConfig>,

    /// Orders submitted after registration, in file order
    #[serde(default)]
    pub seed_orders: Vec<SeedOrderConfig>,
}

fn default_venue_name() -> String {
    "Sigma Venue".to_string()
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            name: default_venue_name(),
            instruments: Vec::new(),
            participants: Vec::new(),
            seed_orders: Vec::new(),
        }
    }
}

impl VenueConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Register everything in this config on `venue`, then replay seed orders
    pub fn apply_to(&self, venue: &Venue) -> Result<(), ConfigError> {
        for instrument in &self.instruments {
            venue.register_instrument(instrument.to_instrument())?;
        }

        for participant in &self.participants {
            for holding in &participant.holdings {
                let code = InstrumentCode::from(holding.instrument.as_str());
                if venue.instrument(&code).is_err() {
                    return Err(ConfigError::InvalidAccount(format!(
                        "holding in unlisted instrument {}",
                        code
                    )));
                }
            }
            venue.register_participant(participant.to_account()?)?;
        }

        for seed in &self.seed_orders {
            let order = Order::new_with_time(
                seed.order_id.as_str(),
                seed.participant.as_str(),
                seed.side,
                seed.price,
                seed.quantity,
                venue.now(),
            );
            venue.submit_order(&InstrumentCode::from(seed.instrument.as_str()), order)?;
        }

        Ok(())
    }
}

impl Venue {
    /// Build a venue on system time from a loaded config
    pub fn from_config(config: &VenueConfig) -> Result<Self, ConfigError> {
        let venue = Venue::new(config.name.clone());
        config.apply_to(&venue)?;
        Ok(venue)
    }
}

/// Instrument listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reference_price: Price,
}

impl InstrumentConfig {
    pub fn to_instrument(&self) -> Instrument {
        Instrument::new(
            self.code.as_str(),
            self.description.clone(),
            self.reference_price,
        )
    }
}

/// Participant account with opening state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantConfig {
    /// Allocated by the venue when omitted
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub balance: Amount,
    #[serde(default)]
    pub holdings: Vec<HoldingConfig>,
}

impl ParticipantConfig {
    pub fn to_account(&self) -> Result<ParticipantAccount, ConfigError> {
        let id = self.id.clone().unwrap_or_default();
        let mut account = ParticipantAccount::funded(id.as_str(), self.balance)
            .map_err(|e| ConfigError::InvalidAccount(format!("{}: {}", id, e)))?;

        for holding in &self.holdings {
            if holding.average_cost < Decimal::ZERO {
                return Err(ConfigError::InvalidAccount(format!(
                    "{}: negative cost basis for {}",
                    id, holding.instrument
                )));
            }
            account = account
                .with_holding(
                    holding.instrument.as_str(),
                    holding.quantity,
                    holding.average_cost,
                )
                .map_err(|e| ConfigError::InvalidAccount(format!("{}: {}", id, e)))?;
        }

        Ok(account)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingConfig {
    pub instrument: String,
    pub quantity: Quantity,
    #[serde(default)]
    pub average_cost: Price,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedOrderConfig {
    /// Instrument to place the order on
    pub instrument: String,
    pub order_id: String,
    /// Owner of the order
    pub participant: String,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
}

/// Configuration errors
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid account config: {0}")]
    InvalidAccount(String),

    #[error(transparent)]
    Venue(#[from] VenueError),
}
