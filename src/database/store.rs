//! Boundary between the review core and whatever holds decks and cards.

use crate::error::StoreResult;
use crate::models::{Card, CardId, DeckId, DeckSummary, SchedulingState};
use async_trait::async_trait;

/// Persistent home of decks and cards.
///
/// The review core only ever reads a deck's cards and writes back one card's
/// scheduling fields after a review.
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Overwrites the scheduling fields of one card.
    ///
    /// Fails with `CardNotFound` if the card is not in the deck.
    async fn persist_card_state(
        &self,
        deck_id: &DeckId,
        card_id: &CardId,
        state: &SchedulingState,
    ) -> StoreResult<()>;

    /// All cards of a deck, in no particular order.
    async fn load_cards(&self, deck_id: &DeckId) -> StoreResult<Vec<Card>>;

    async fn list_decks(&self) -> StoreResult<Vec<DeckSummary>>;
}
