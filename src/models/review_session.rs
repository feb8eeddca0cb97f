//! Review session management for spaced repetition practice.
//!
//! A session is a single linear walk over the cards that were due when it started.
//! Each rating is scheduled with SM-2 and written to the card store before the
//! cursor moves on. If the write fails the session stays on the same card and keeps
//! the computed state so the write can be retried unchanged.

use super::due::select_due_cards;
use super::sm2::Sm2Scheduler;
use super::{Card, CardId, DeckId, Quality, SchedulingState};
use crate::database::store::CardStore;
use crate::error::ReviewError;
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::sync::Arc;

/// Result of starting a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Started { due: usize },
    /// No card was due; no session was entered.
    NothingDue,
}

/// Result of a successfully persisted review.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// The cursor moved to `next_index` (zero-based).
    Advanced { next_index: usize },
    /// That was the last card; the session is over.
    Completed { reviewed: usize },
}

/// How the most recent session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    Completed,
    Cancelled,
    NothingDue,
}

/// A rating whose new state is computed but not yet stored.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingReview {
    pub card_id: CardId,
    pub quality: Quality,
    pub state: SchedulingState,
}

struct ActiveSession {
    deck_id: DeckId,
    queue: Vec<Card>,
    cursor: usize,
    pending: Option<PendingReview>,
}

/// Drives one review session at a time over a deck's due cards.
pub struct ReviewSessionManager<S: CardStore> {
    store: Arc<S>,
    scheduler: Sm2Scheduler,
    active: Option<ActiveSession>,
    last_end: Option<SessionEnd>,
}

impl<S: CardStore> ReviewSessionManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_scheduler(store, Sm2Scheduler::default())
    }

    pub fn with_scheduler(store: Arc<S>, scheduler: Sm2Scheduler) -> Self {
        Self {
            store,
            scheduler,
            active: None,
            last_end: None,
        }
    }

    pub fn scheduler(&self) -> &Sm2Scheduler {
        &self.scheduler
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// How the previous session ended, if any session has ended.
    pub fn last_end(&self) -> Option<SessionEnd> {
        self.last_end
    }

    /// Starts a session over the cards of `deck_id` that are due at `now`.
    ///
    /// The due queue is copied; later changes to `cards` do not affect it.
    pub fn start(
        &mut self,
        deck_id: DeckId,
        cards: &[Card],
        now: DateTime<Utc>,
    ) -> Result<StartOutcome, ReviewError> {
        if self.active.is_some() {
            return Err(ReviewError::SessionAlreadyActive);
        }

        let queue = select_due_cards(cards, now);
        if queue.is_empty() {
            info!("no cards due in deck {}", deck_id);
            self.last_end = Some(SessionEnd::NothingDue);
            return Ok(StartOutcome::NothingDue);
        }

        let due = queue.len();
        info!("starting review of deck {} with {} due cards", deck_id, due);
        self.active = Some(ActiveSession {
            deck_id,
            queue,
            cursor: 0,
            pending: None,
        });
        Ok(StartOutcome::Started { due })
    }

    /// Loads the deck's current cards from the store and starts a session.
    pub async fn start_from_store(
        &mut self,
        deck_id: DeckId,
        now: DateTime<Utc>,
    ) -> Result<StartOutcome, ReviewError> {
        if self.active.is_some() {
            return Err(ReviewError::SessionAlreadyActive);
        }
        let cards = match self.store.load_cards(&deck_id).await {
            Ok(cards) => cards,
            Err(source) => return Err(ReviewError::Load { deck_id, source }),
        };
        self.start(deck_id, &cards, now)
    }

    pub fn current_card(&self) -> Result<&Card, ReviewError> {
        let session = self.active.as_ref().ok_or(ReviewError::NoActiveSession)?;
        Ok(&session.queue[session.cursor])
    }

    /// One-based position of the current card and the queue length.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.active
            .as_ref()
            .map(|session| (session.cursor + 1, session.queue.len()))
    }

    pub fn pending(&self) -> Option<&PendingReview> {
        self.active.as_ref().and_then(|session| session.pending.as_ref())
    }

    /// Rates the current card, persists its new state and moves on.
    ///
    /// On a store failure the cursor does not move and the computed state is kept;
    /// use [`retry_pending`](Self::retry_pending) to write it again or
    /// [`discard_pending`](Self::discard_pending) to rate the card afresh.
    pub async fn submit_review(
        &mut self,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome, ReviewError> {
        let session = self.active.as_mut().ok_or(ReviewError::NoActiveSession)?;
        if let Some(pending) = &session.pending {
            return Err(ReviewError::ReviewPending {
                card_id: pending.card_id.clone(),
            });
        }

        let card = &session.queue[session.cursor];
        let state = self.scheduler.next_state(&card.schedule, quality, now);
        info!(
            "card {} rated {}, next review {}",
            card.id,
            quality,
            state.next_review_date.to_rfc3339()
        );
        session.pending = Some(PendingReview {
            card_id: card.id.clone(),
            quality,
            state,
        });

        self.persist_pending().await
    }

    /// Writes the retained state of a failed review again, without recomputing it.
    pub async fn retry_pending(&mut self) -> Result<ReviewOutcome, ReviewError> {
        let session = self.active.as_ref().ok_or(ReviewError::NoActiveSession)?;
        if session.pending.is_none() {
            return Err(ReviewError::NoPendingReview);
        }
        self.persist_pending().await
    }

    /// Drops the retained state of a failed review so the card can be rated again.
    pub fn discard_pending(&mut self) -> Result<Option<PendingReview>, ReviewError> {
        let session = self.active.as_mut().ok_or(ReviewError::NoActiveSession)?;
        Ok(session.pending.take())
    }

    /// Ends the session immediately. Remaining cards and any unsaved review are
    /// dropped without touching the store.
    pub fn cancel(&mut self) -> Result<(), ReviewError> {
        let session = self.active.take().ok_or(ReviewError::NoActiveSession)?;
        info!(
            "review of deck {} cancelled at card {} of {}",
            session.deck_id,
            session.cursor + 1,
            session.queue.len()
        );
        self.last_end = Some(SessionEnd::Cancelled);
        Ok(())
    }

    async fn persist_pending(&mut self) -> Result<ReviewOutcome, ReviewError> {
        let session = self.active.as_mut().ok_or(ReviewError::NoActiveSession)?;
        let Some(pending) = session.pending.as_ref() else {
            return Err(ReviewError::NoPendingReview);
        };

        if let Err(source) = self
            .store
            .persist_card_state(&session.deck_id, &pending.card_id, &pending.state)
            .await
        {
            warn!("could not save review of card {}: {}", pending.card_id, source);
            return Err(ReviewError::Persistence {
                card_id: pending.card_id.clone(),
                source,
            });
        }

        session.pending = None;
        if session.cursor + 1 < session.queue.len() {
            session.cursor += 1;
            return Ok(ReviewOutcome::Advanced {
                next_index: session.cursor,
            });
        }

        let reviewed = session.queue.len();
        info!("review of deck {} completed, {} cards reviewed", session.deck_id, reviewed);
        self.active = None;
        self.last_end = Some(SessionEnd::Completed);
        Ok(ReviewOutcome::Completed { reviewed })
    }
}
