//! Error types for the scheduler, the review session and the card stores.

use crate::models::{CardId, DeckId};
use thiserror::Error;

/// Errors raised by the review session and rating validation.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Quality ratings must be in 0..=5
    #[error("quality rating {0} is outside 0..=5")]
    InvalidQuality(i64),

    #[error("no review session is active")]
    NoActiveSession,

    #[error("a review session is already active")]
    SessionAlreadyActive,

    /// A rating for the current card is computed but not yet persisted.
    /// Retry or discard it before rating again.
    #[error("review of card {card_id} has not been persisted yet")]
    ReviewPending { card_id: CardId },

    #[error("there is no unsaved review to retry")]
    NoPendingReview,

    #[error("failed to load cards of deck {deck_id}: {source}")]
    Load {
        deck_id: DeckId,
        #[source]
        source: StoreError,
    },

    #[error("failed to persist review of card {card_id}: {source}")]
    Persistence {
        card_id: CardId,
        #[source]
        source: StoreError,
    },
}

/// Errors from a [`CardStore`](crate::database::store::CardStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("card {card_id} not found in deck {deck_id}")]
    CardNotFound { deck_id: DeckId, card_id: CardId },

    #[error("deck {0} not found")]
    DeckNotFound(DeckId),

    #[error("a deck named '{0}' already exists")]
    DuplicateDeck(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A card record breaks the scheduling invariants and was not stored.
    #[error("card {card_id} has invalid scheduling state: {reason}")]
    InvalidRecord { card_id: CardId, reason: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from deck import/export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid deck json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("card {card_id} has invalid scheduling state: {reason}")]
    Invalid { card_id: CardId, reason: String },
}

/// Errors from loading the application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
