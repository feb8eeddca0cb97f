//! In-memory card store.
//!
//! Holds decks in a map and can be told to fail upcoming writes, which is how the
//! review session's persistence-failure handling is exercised in tests.

use super::store::CardStore;
use crate::error::{StoreError, StoreResult};
use crate::models::{Card, CardId, Deck, DeckId, DeckSummary, SchedulingState};
use async_trait::async_trait;
use log::warn;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

/// A successful `persist_card_state` call, as recorded by [`MemoryStore`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedWrite {
    pub deck_id: DeckId,
    pub card_id: CardId,
    pub state: SchedulingState,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    decks: RwLock<BTreeMap<DeckId, Deck>>,
    failing_writes: AtomicUsize,
    writes: Mutex<Vec<RecordedWrite>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decks(decks: impl IntoIterator<Item = Deck>) -> Self {
        let store = Self::new();
        for deck in decks {
            store.insert_deck(deck);
        }
        store
    }

    /// Adds or replaces a deck. A poisoned lock is recovered, not skipped.
    pub fn insert_deck(&self, deck: Deck) {
        let mut decks = self.decks.write().unwrap_or_else(|poisoned| {
            warn!("memory store lock poisoned while inserting deck {}", deck.id);
            poisoned.into_inner()
        });
        decks.insert(deck.id.clone(), deck);
    }

    pub fn card(&self, deck_id: &DeckId, card_id: &CardId) -> Option<Card> {
        let decks = self.decks.read().ok()?;
        decks
            .get(deck_id)?
            .cards
            .iter()
            .find(|card| &card.id == card_id)
            .cloned()
    }

    /// Makes the next `count` writes fail with `StoreError::Unavailable`.
    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Successful writes, oldest first.
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes
            .lock()
            .map(|writes| writes.clone())
            .unwrap_or_default()
    }

    fn take_injected_failure(&self) -> bool {
        self.failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn poisoned<E>(_: E) -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".to_string())
}

#[async_trait]
impl CardStore for MemoryStore {
    async fn persist_card_state(
        &self,
        deck_id: &DeckId,
        card_id: &CardId,
        state: &SchedulingState,
    ) -> StoreResult<()> {
        if self.take_injected_failure() {
            return Err(StoreError::Unavailable("injected write failure".to_string()));
        }

        {
            let mut decks = self.decks.write().map_err(poisoned)?;
            let deck = decks
                .get_mut(deck_id)
                .ok_or_else(|| StoreError::DeckNotFound(deck_id.clone()))?;
            let card = deck
                .cards
                .iter_mut()
                .find(|card| &card.id == card_id)
                .ok_or_else(|| StoreError::CardNotFound {
                    deck_id: deck_id.clone(),
                    card_id: card_id.clone(),
                })?;
            card.schedule = state.clone();
        }

        self.writes.lock().map_err(poisoned)?.push(RecordedWrite {
            deck_id: deck_id.clone(),
            card_id: card_id.clone(),
            state: state.clone(),
        });
        Ok(())
    }

    async fn load_cards(&self, deck_id: &DeckId) -> StoreResult<Vec<Card>> {
        let decks = self.decks.read().map_err(poisoned)?;
        decks
            .get(deck_id)
            .map(|deck| deck.cards.clone())
            .ok_or_else(|| StoreError::DeckNotFound(deck_id.clone()))
    }

    async fn list_decks(&self) -> StoreResult<Vec<DeckSummary>> {
        let decks = self.decks.read().map_err(poisoned)?;
        Ok(decks
            .values()
            .map(|deck| DeckSummary {
                id: deck.id.clone(),
                name: deck.name.clone(),
                card_count: deck.cards.len(),
            })
            .collect())
    }
}
