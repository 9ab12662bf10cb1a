pub mod config;
pub mod id_allocator;
pub mod service;

pub use config::{
    ConfigError, HoldingConfig, InstrumentConfig, ParticipantConfig, SeedOrderConfig, VenueConfig,
};
pub use id_allocator::{SequentialAllocator, UuidAllocator};
pub use service::{VenueCommand, VenueHandle, VenueService};
