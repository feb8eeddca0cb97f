pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;

pub use config::{AppConfig, SchedulerConfig};
pub use error::{ConfigError, ExportError, ReviewError, StoreError};
pub use models::{
    Card, CardId, Deck, DeckId, Quality, ReviewSessionManager, SchedulingState, Sm2Scheduler,
};
