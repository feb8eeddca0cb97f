pub mod card;
pub mod deck;
pub mod due;
pub mod quality;
pub mod review_session;
pub mod sm2;

pub use card::{Card, CardId, MAX_INTERVAL_DAYS, MIN_EASE_FACTOR, SchedulingState};
pub use deck::{Deck, DeckId, DeckSummary};
pub use due::{DeckProgress, DueStatus, classify_due, count_due, count_learned, select_due_cards};
pub use quality::{Quality, QualityBand};
pub use review_session::{
    PendingReview, ReviewOutcome, ReviewSessionManager, SessionEnd, StartOutcome,
};
pub use sm2::{Sm2Scheduler, compute_next_state};
